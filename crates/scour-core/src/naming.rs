use rand::RngCore;

/// Random bytes behind an obfuscated name (48 hex characters).
pub const NAME_BYTES: usize = 24;

/// Extension given to renamed files so intermediate names look like ordinary temp files.
pub const FILE_EXTENSION: &str = "tmp";

/// Lowercase hex string of `2 * byte_len` characters from a CSPRNG.
pub fn random_hex(byte_len: usize) -> String {
    let mut bytes = vec![0u8; byte_len];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A fresh obfuscated name; files get [`FILE_EXTENSION`], directories none.
pub fn obfuscated_name(with_extension: bool) -> String {
    let stem = random_hex(NAME_BYTES);
    if with_extension {
        format!("{}.{}", stem, FILE_EXTENSION)
    } else {
        stem
    }
}

/// True when `name` has the shape produced by [`obfuscated_name`].
#[cfg(test)]
pub(crate) fn is_obfuscated_name(name: &str) -> bool {
    let stem = name
        .strip_suffix(FILE_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(name);
    stem.len() == NAME_BYTES * 2
        && stem
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_hex_length_and_alphabet() {
        let name = random_hex(8);
        assert_eq!(name.len(), 16);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_random_hex_uncorrelated() {
        assert_ne!(random_hex(NAME_BYTES), random_hex(NAME_BYTES));
    }

    #[test]
    fn test_obfuscated_names() {
        let file = obfuscated_name(true);
        let dir = obfuscated_name(false);
        assert!(file.ends_with(".tmp"));
        assert_eq!(file.len(), 52);
        assert_eq!(dir.len(), 48);
        assert!(is_obfuscated_name(&file));
        assert!(is_obfuscated_name(&dir));
        assert!(!is_obfuscated_name("secret-report.docx"));
    }
}
