//! # Auto-Coding
//!
//! Short item codes and salesperson usernames.
//!
//! ```text
//! generate_item_code(Some("Beverages"), "Cola 330ml", rng) → "BEVCOL042"
//!                          └─┬─┘          └─┬─┘     └┬┘
//!                     category[..3]    item[..3]   000-999
//!
//! generate_username("Mary Jane Watson") → "maryj"
//! legacy_password("maryj")              → "maryj123"
//! ```
//!
//! Neither generator guarantees uniqueness. Callers check for an existing
//! code or username in the store and report the collision; there is no retry.

use rand::Rng;

use crate::FALLBACK_CODE_PREFIX;

/// Uppercased first `n` characters (by char, not byte) of `s`.
fn prefix_upper(s: &str, n: usize) -> String {
    s.trim().chars().take(n).flat_map(char::to_uppercase).collect()
}

/// Generates an item code from the category and item names.
///
/// ## Arguments
/// * `category_name` - `None` or blank falls back to `GEN`
/// * `item_name` - Item display name
/// * `rng` - Source of the 3-digit suffix
pub fn generate_item_code<R: Rng + ?Sized>(
    category_name: Option<&str>,
    item_name: &str,
    rng: &mut R,
) -> String {
    let category = match category_name.map(str::trim) {
        Some(name) if !name.is_empty() => prefix_upper(name, 3),
        _ => FALLBACK_CODE_PREFIX.to_string(),
    };
    let suffix: u16 = rng.gen_range(0..1000);

    format!("{}{}{:03}", category, prefix_upper(item_name, 3), suffix)
}

/// Generates a login name: lowercase, whitespace removed, first 5 characters.
pub fn generate_username(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .take(5)
        .collect()
}

/// The initial password given to provisioned salespersons.
///
/// This is a weak, guessable scheme kept for compatibility with how
/// salesperson accounts have always been handed out. Admins should ask
/// salespersons to change it.
pub fn legacy_password(username: &str) -> String {
    format!("{}123", username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_item_code_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = generate_item_code(Some("Beverages"), "Cola 330ml", &mut rng);

        assert_eq!(code.len(), 9);
        assert!(code.starts_with("BEVCOL"));
        assert!(code[6..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_item_code_fallback_category() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_item_code(None, "soap", &mut rng).starts_with("GENSOA"));
        assert!(generate_item_code(Some("  "), "soap", &mut rng).starts_with("GENSOA"));
    }

    #[test]
    fn test_item_code_short_names() {
        let mut rng = StdRng::seed_from_u64(3);
        let code = generate_item_code(Some("Tv"), "X", &mut rng);
        assert!(code.starts_with("TVX"));
        assert_eq!(code.len(), 6);
    }

    #[test]
    fn test_item_code_is_char_based() {
        let mut rng = StdRng::seed_from_u64(3);
        let code = generate_item_code(Some("çay"), "éclair", &mut rng);
        assert!(code.starts_with("ÇAYÉCL"));
    }

    #[test]
    fn test_same_seed_same_code() {
        let a = generate_item_code(Some("Dairy"), "Milk", &mut StdRng::seed_from_u64(42));
        let b = generate_item_code(Some("Dairy"), "Milk", &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_username() {
        assert_eq!(generate_username("Mary Jane Watson"), "maryj");
        assert_eq!(generate_username("  Al  "), "al");
        assert_eq!(generate_username("BOB"), "bob");
        assert_eq!(generate_username(""), "");
    }

    #[test]
    fn test_legacy_password() {
        assert_eq!(legacy_password("maryj"), "maryj123");
    }
}
