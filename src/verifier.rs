//! Encoding, parsing and constant-time checking of password hashes of the
//! form `$argon2id$m=4096,t=3,p=1$<salt>$<hash>` with unpadded base64
//! fields.

use crate::{defaults, Argon2, Error, Variant};
use std::str;

macro_rules! maybe {
    ($e: expr) => {
        match $e {
            None => return None,
            Some(v) => v,
        }
    };
}

const LUT64: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn lut(n: u8) -> u8 { LUT64[n as usize & 0x3f] }

fn delut(c: u8) -> Option<u8> {
    match c {
        43 => Some(62),
        47 => Some(63),
        _ if 65 <= c && c <= 90 => Some(c - 65),
        _ if 97 <= c && c <= 122 => Some(c - 71),
        _ if 48 <= c && c <= 57 => Some(c + 4),
        _ => None,
    }
}

fn quad(n: &[u8]) -> [u8; 4] {
    assert!(n.len() == 3);
    let (b, c) = (n[1] >> 4 | n[0] << 4, n[2] >> 6 | n[1] << 2);
    [lut(n[0] >> 2), lut(b), lut(c), lut(n[2])]
}

fn triplet(n: &[u8]) -> Option<[u8; 3]> {
    assert!(n.len() == 4);
    let a = maybe!(delut(n[0]));
    let b = maybe!(delut(n[1]));
    let c = maybe!(delut(n[2]));
    let d = maybe!(delut(n[3]));
    Some([a << 2 | b >> 4, b << 4 | c >> 2, c << 6 | d])
}

fn base64_no_pad(bytes: &[u8]) -> Vec<u8> {
    let mut rv = vec![];
    let mut pos = 0;
    while pos + 3 <= bytes.len() {
        rv.extend_from_slice(&quad(&bytes[pos..pos + 3]));
        pos += 3;
    }

    if bytes.len() - pos == 1 {
        rv.push(lut(bytes[pos] >> 2));
        rv.push(lut((bytes[pos] & 0x03) << 4));
    } else if bytes.len() - pos == 2 {
        rv.extend_from_slice(&quad(&[bytes[pos], bytes[pos + 1], 0]));
        rv.pop();
    }
    rv
}

fn debase64_no_pad(bytes: &[u8]) -> Option<Vec<u8>> {
    if bytes.len() % 4 != 1 && bytes.len() > 0 {
        let mut rv = vec![];
        let mut pos = 0;
        while pos + 4 <= bytes.len() {
            let s = maybe!(triplet(&bytes[pos..pos + 4]));
            rv.extend_from_slice(&s);
            pos += 4;
        }

        if bytes.len() - pos == 2 {
            let a = maybe!(delut(bytes[pos]));
            let b = maybe!(delut(bytes[pos + 1]));
            rv.push(a << 2 | b >> 4);
        } else if bytes.len() - pos == 3 {
            let a = maybe!(delut(bytes[pos]));
            let b = maybe!(delut(bytes[pos + 1]));
            let c = maybe!(delut(bytes[pos + 2]));
            rv.push(a << 2 | b >> 4);
            rv.push(b << 4 | c >> 2);
        }
        Some(rv)
    } else {
        None
    }
}

struct Parser<'a> {
    enc: &'a [u8],
    pos: usize,
}

type Parsed<T> = Result<T, usize>;

impl<'a> Parser<'a> {
    fn expect(&mut self, exp: &[u8]) -> Parsed<()> {
        if self.enc.len() - self.pos < exp.len() ||
           &self.enc[self.pos..self.pos + exp.len()] != exp {
            self.err()
        } else {
            self.pos += exp.len();
            Ok(())
        }
    }

    // consumes up to (not including) the next `stop` byte, or to the end
    fn until(&mut self, stop: u8) -> &'a [u8] {
        let end = self.enc[self.pos..]
                      .iter()
                      .position(|&c| c == stop)
                      .map(|k| self.pos + k)
                      .unwrap_or(self.enc.len());
        let rv = &self.enc[self.pos..end];
        self.pos = end;
        rv
    }

    fn read_u32(&mut self) -> Parsed<u32> {
        let is_digit = |c: u8| 48 <= c && c <= 57;
        let mut end = self.pos;
        while end < self.enc.len() && is_digit(self.enc[end]) {
            end += 1;
        }
        match str::from_utf8(&self.enc[self.pos..end]) {
            Err(_) => self.err(),
            Ok(s) => {
                match s.parse() {
                    Err(_) => self.err(),
                    Ok(n) => {
                        self.pos = end;
                        Ok(n)
                    }
                }
            }
        }
    }

    fn decode64_till(&mut self, stops: &[u8]) -> Parsed<Vec<u8>> {
        let end = self.enc[self.pos..]
                      .iter()
                      .position(|c| stops.contains(c))
                      .map(|k| self.pos + k)
                      .unwrap_or(self.enc.len());
        match debase64_no_pad(&self.enc[self.pos..end]) {
            None => self.err(),
            Some(rv) => {
                self.pos = end;
                Ok(rv)
            }
        }
    }

    fn err<T>(&self) -> Parsed<T> { Err(self.pos) }
}

#[derive(Debug)]
pub enum DecodeError {
    /// Byte offset at which the encoded hash stopped making sense.
    ParseError(usize),
    InvalidParams(Error),
}

pub struct Verifier {
    params: Argon2,
    hash: Vec<u8>,
    salt: Vec<u8>,
    key: Vec<u8>,
    data: Vec<u8>,
}

type Packed = (Variant, u32, u32, u32, Vec<u8>, Vec<u8>, Vec<u8>, Vec<u8>);

impl Verifier {
    fn parse(encoded: &[u8]) -> Result<Packed, usize> {
        let mut p = Parser {
            enc: encoded,
            pos: 0,
        };

        p.expect(b"$argon2")?;

        let code_at = p.pos;
        let code = p.until(b'$');
        let variant = match str::from_utf8(code)
                                .ok()
                                .and_then(Variant::from_code) {
            Some(v) => v,
            None => return Err(code_at),
        };

        p.expect(b"$m=")?;
        let kib = p.read_u32()?;
        p.expect(b",t=")?;
        let passes = p.read_u32()?;
        p.expect(b",p=")?;
        let lanes = p.read_u32()?;

        let key = match p.expect(b",keyid=") {
            Err(_) => vec![],
            Ok(()) => p.decode64_till(b",$")?,
        };

        let data = match p.expect(b",data=") {
            Ok(()) => p.decode64_till(b"$")?,
            Err(_) => vec![],
        };

        p.expect(b"$")?;
        let salt = p.decode64_till(b"$")?;
        p.expect(b"$")?;
        let hash = p.decode64_till(b"")?;
        Ok((variant, kib, passes, lanes, key, data, salt, hash))
    }

    pub fn from_u8(encoded: &[u8]) -> Result<Self, DecodeError> {
        match Self::parse(encoded) {
            Err(pos) => Err(DecodeError::ParseError(pos)),
            Ok((v, kib, passes, lanes, key, data, salt, hash)) => {
                match Argon2::new(passes, lanes, kib, v) {
                    Err(e) => Err(DecodeError::InvalidParams(e)),
                    Ok(a2) => {
                        Ok(Verifier {
                            params: a2,
                            hash,
                            salt,
                            key,
                            data,
                        })
                    }
                }
            }
        }
    }

    #[cfg_attr(rustfmt, rustfmt_skip)]
    pub fn to_u8(&self) -> Vec<u8> {
        let b64 = |x: &[u8]| String::from_utf8(base64_no_pad(x)).unwrap();
        let k_ = match &b64(&self.key[..]) {
            bytes if bytes.len() > 0 => format!(",keyid={}", bytes),
            _ => String::new(),
        };
        let x_ = match &b64(&self.data[..]) {
            bytes if bytes.len() > 0 => format!(",data={}", bytes),
            _ => String::new(),
        };
        let (var, m, t, p) = self.params.params();
        format!("$argon2{}$m={},t={},p={}{}{}${}${}", var.code(), m, t, p,
                k_, x_, b64(&self.salt[..]), b64(&self.hash))
            .into_bytes()
    }

    pub fn new(argon: Argon2, p: &[u8], s: &[u8], k: &[u8], x: &[u8]) -> Self {
        let mut out = vec![0u8; defaults::LENGTH];
        argon.hash(&mut out[..], p, s, k, x);
        Verifier {
            params: argon,
            hash: out,
            salt: s.to_vec(),
            key: k.to_vec(),
            data: x.to_vec(),
        }
    }

    pub fn verify(&self, p: &[u8]) -> bool {
        let mut out = [0u8; defaults::LENGTH];
        let s = &self.salt[..];
        self.params.hash(&mut out, p, s, &self.key[..], &self.data[..]);
        constant_eq(&out, &self.hash)
    }
}

pub fn constant_eq(xs: &[u8], ys: &[u8]) -> bool {
    if xs.len() != ys.len() {
        false
    } else {
        xs.iter().zip(ys.iter()).fold(0, |rv, (x, y)| rv | (x ^ y)) == 0
    }
}

#[cfg(test)]
mod test {
    use super::{base64_no_pad, constant_eq, debase64_no_pad, DecodeError,
                Verifier};
    use crate::{Argon2, Variant};

    const BASE64_CASES: [(&[u8], &[u8]); 5] =
        [(b"any carnal pleasure.", b"YW55IGNhcm5hbCBwbGVhc3VyZS4"),
         (b"any carnal pleasure", b"YW55IGNhcm5hbCBwbGVhc3VyZQ"),
         (b"any carnal pleasur", b"YW55IGNhcm5hbCBwbGVhc3Vy"),
         (b"any carnal pleasu", b"YW55IGNhcm5hbCBwbGVhc3U"),
         (b"any carnal pleas", b"YW55IGNhcm5hbCBwbGVhcw")];

    #[test]
    fn test_base64_no_pad() {
        for &(s, exp) in BASE64_CASES.iter() {
            assert_eq!(&base64_no_pad(s)[..], exp);
        }
    }

    #[test]
    fn test_debase64_no_pad() {
        for &(exp, s) in BASE64_CASES.iter() {
            assert_eq!(debase64_no_pad(s).unwrap(), exp);
        }
    }

    #[test]
    fn round_trip_covers_every_variant() {
        for &v in &[Variant::Argon2d, Variant::Argon2i, Variant::Argon2di,
                    Variant::Argon2id, Variant::Argon2ds] {
            let a2 = Argon2::new(1, 1, 8, v).unwrap();
            let enc = Verifier::new(a2, b"argon2!", b"somesalt", b"key",
                                    b"data")
                .to_u8();
            let dec = Verifier::from_u8(&enc).unwrap();

            let (var, m, t, p) = dec.params.params();
            assert_eq!(var, v);
            assert_eq!((m, t, p), (8, 1, 1));
            assert_eq!(dec.to_u8(), enc);
            assert!(dec.verify(b"argon2!"));
            assert!(!dec.verify(b"nope"));
        }
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let a2 = Argon2::new(1, 1, 8, Variant::Argon2i).unwrap();
        let enc = Verifier::new(a2, b"argon2!", b"somesalt", &[], &[]).to_u8();
        let text = String::from_utf8(enc.clone()).unwrap();
        assert!(text.starts_with("$argon2i$m=8,t=1,p=1$"));
        assert!(!text.contains("keyid"));
        assert!(!text.contains("data"));
        assert!(Verifier::from_u8(&enc).unwrap().verify(b"argon2!"));
    }

    #[test]
    fn unknown_variant_code_is_a_parse_error() {
        match Verifier::from_u8(b"$argon2x$m=8,t=1,p=1$c29tZXNhbHQ$YWJjZA") {
            Err(DecodeError::ParseError(pos)) => assert_eq!(pos, 7),
            other => panic!("expected a parse error, got {:?}",
                            other.err().map(|e| format!("{:?}", e))),
        }
    }

    #[test]
    fn undersized_parameters_fail_decoding() {
        match Verifier::from_u8(b"$argon2d$m=4,t=1,p=1$c29tZXNhbHQ$YWJjZA") {
            Err(DecodeError::InvalidParams(_)) => {}
            _ => panic!("m=4 must be rejected"),
        }
    }

    #[test]
    fn constant_eq_needs_equal_lengths_and_bytes() {
        assert!(constant_eq(b"same bytes", b"same bytes"));
        assert!(!constant_eq(b"same bytes", b"same bytez"));
        assert!(!constant_eq(b"same bytes", b"same byte"));
        assert!(constant_eq(b"", b""));
    }
}
