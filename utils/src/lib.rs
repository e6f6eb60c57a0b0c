pub mod common;
pub mod shuffle;
pub mod trie;
pub mod mmr;
pub mod bandersnatch;
pub mod serialization;

#[macro_export] macro_rules! print_hash {
    ($hash:expr) => {{
        let hash_str = $hash.iter().map(|byte| format!("{:02x}", byte)).collect::<String>();
        if hash_str.len() > 8 {
            format!("{}...{}", &hash_str[..4], &hash_str[hash_str.len()-4..])
        } else {
            hash_str
        }
    }};
}

#[cfg(test)]
mod test {

    #[test]
    fn print_hash_truncates() {
        assert_eq!("0102...1f20", print_hash!((1u8..=32).collect::<Vec<u8>>()));
        assert_eq!("0a0b", print_hash!([10u8, 11]));
    }
}
