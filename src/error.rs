use std::error;
use std::fmt;

/// Everything that can go wrong before the filler starts. Validation runs
/// ahead of any allocation, so a failure here has no side effects.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Error {
    OutputPtrNull,
    OutputTooShort,
    OutputTooLong,
    PwdTooShort,
    PwdTooLong,
    SaltTooShort,
    SaltTooLong,
    AdTooShort,
    AdTooLong,
    SecretTooShort,
    SecretTooLong,
    TimeTooSmall,
    TimeTooLarge,
    MemoryTooLittle,
    MemoryTooMuch,
    LanesTooFew,
    LanesTooMany,
    PwdPtrMismatch,
    SaltPtrMismatch,
    SecretPtrMismatch,
    AdPtrMismatch,
    MemoryAllocationError,
    FreeMemoryCbkNull,
    AllocateMemoryCbkNull,
    IncorrectParameter,
    IncorrectType,
    OutPtrMismatch,
}

impl Error {
    pub fn message(&self) -> &'static str {
        match *self {
            Error::OutputPtrNull => "Output pointer is NULL",
            Error::OutputTooShort => "Output is too short",
            Error::OutputTooLong => "Output is too long",
            Error::PwdTooShort => "Password is too short",
            Error::PwdTooLong => "Password is too long",
            Error::SaltTooShort => "Salt is too short",
            Error::SaltTooLong => "Salt is too long",
            Error::AdTooShort => "Associated data is too short",
            Error::AdTooLong => "Associated data is too long",
            Error::SecretTooShort => "Secret is too short",
            Error::SecretTooLong => "Secret is too long",
            Error::TimeTooSmall => "Time cost is too small",
            Error::TimeTooLarge => "Time cost is too large",
            Error::MemoryTooLittle => "Memory cost is too small",
            Error::MemoryTooMuch => "Memory cost is too large",
            Error::LanesTooFew => "Too few lanes",
            Error::LanesTooMany => "Too many lanes",
            Error::PwdPtrMismatch => {
                "Password pointer is NULL, but password length is not 0"
            }
            Error::SaltPtrMismatch => {
                "Salt pointer is NULL, but salt length is not 0"
            }
            Error::SecretPtrMismatch => {
                "Secret pointer is NULL, but secret length is not 0"
            }
            Error::AdPtrMismatch => {
                "Associated data pointer is NULL, but ad length is not 0"
            }
            Error::MemoryAllocationError => "Memory allocation error",
            Error::FreeMemoryCbkNull => "The free memory callback is NULL",
            Error::AllocateMemoryCbkNull => {
                "The allocate memory callback is NULL"
            }
            Error::IncorrectParameter => "Context is missing",
            Error::IncorrectType => "There is no such version of Argon2",
            Error::OutPtrMismatch => "Output pointer mismatch",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl error::Error for Error {}

#[cfg(test)]
mod test {
    use super::Error;

    #[test]
    fn messages_are_stable() {
        assert_eq!(Error::SaltTooShort.message(), "Salt is too short");
        assert_eq!(Error::LanesTooMany.message(), "Too many lanes");
        assert_eq!(Error::MemoryTooLittle.message(),
                   "Memory cost is too small");
        assert_eq!(format!("{}", Error::IncorrectType),
                   "There is no such version of Argon2");
    }
}
