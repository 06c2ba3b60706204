use argon2kdf::{Argon2, Variant};
use std::env;

const CLI_TOOL_SALT_LEN: usize = 16;
const CLI_TOOL_HASH_LEN: usize = 32;

fn digest(variant: Variant, msg: &[u8], salt: &[u8], passes: u32, lanes: u32,
          logkib: u32)
          -> [u8; CLI_TOOL_HASH_LEN] {
    assert!(salt.len() <= CLI_TOOL_SALT_LEN && logkib > 0 && logkib < 32);
    let a = Argon2::new(passes, lanes, 1 << logkib, variant)
        .unwrap_or_else(|e| panic!("bad parameters: {}", e));
    let mut s = [0; CLI_TOOL_SALT_LEN];
    s[..salt.len()].copy_from_slice(salt);

    let mut out = [0u8; CLI_TOOL_HASH_LEN];
    a.hash(&mut out, msg, &s, &[], &[]);
    out
}

fn to_string(bs: &[u8]) -> String {
    let mut rv = String::new();
    for b in bs.iter() {
        rv.push_str(&format!("{:02x}", b));
    }
    rv
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 7 {
        println!("usage: {} passes lanes logkib variant msg salt", args[0]);
        println!("       variant is one of d, i, di, id, ds");
        return;
    }

    let t: u32 = args[1].parse().unwrap();
    let l: u32 = args[2].parse().unwrap();
    let logm: u32 = args[3].parse().unwrap();
    let variant = match Variant::from_code(&args[4]) {
        Some(v) => v,
        None => {
            println!("no such variant: {}", args[4]);
            return;
        }
    };
    let msg = args[5].as_ref();
    let salt = args[6].as_ref();

    println!("Hash: {}", to_string(&digest(variant, msg, salt, t, l, logm)));
}
