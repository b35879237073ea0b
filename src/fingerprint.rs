use sha2::{Digest, Sha256};

use crate::processing::import::ImportFormat;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Key identifying one import of one file, so repeated uploads of the same
/// roster show up in the logs as the same key.
pub fn compute_import_key(file_name: &str, format: ImportFormat, source: &str) -> String {
    let mut s = String::new();
    s.push_str(file_name);
    s.push('|');
    s.push_str(&format.to_string());
    s.push('|');
    s.push_str(&sha256_hex(source.as_bytes()));

    sha256_hex(s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_key_is_stable_and_input_sensitive() {
        let a = compute_import_key("kids.csv", ImportFormat::Csv, "name\nJane");
        assert_eq!(a, compute_import_key("kids.csv", ImportFormat::Csv, "name\nJane"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, compute_import_key("kids.csv", ImportFormat::Tsv, "name\nJane"));
        assert_ne!(a, compute_import_key("kids.csv", ImportFormat::Csv, "name\nJohn"));
        assert_ne!(a, compute_import_key("other.csv", ImportFormat::Csv, "name\nJane"));
    }
}
