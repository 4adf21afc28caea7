//! Deterministic variant selection
//!
//! The variant index is an MD5 of a canonical serialization of the input
//! data, salted with the section kind and content type so that sections of
//! one page pick independently of each other.

use std::collections::BTreeMap;

use super::catalogue::{PatternCatalogue, PatternVariant, SectionKind};
use super::content_type::ContentType;

/// Sorted-key JSON object of the input data.
pub fn canonical_serialization(data: &BTreeMap<String, String>) -> String {
    // BTreeMap iterates in key order, which is what makes this canonical.
    serde_json::to_string(data).unwrap_or_default()
}

/// First eight bytes of the MD5 digest, big-endian
pub fn stable_hash(text: &str) -> u64 {
    let digest = md5::compute(text.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// Index into a catalogue of `len` variants; `len` of zero yields zero
pub fn select_index(
    kind: SectionKind,
    category: ContentType,
    data: &BTreeMap<String, String>,
    len: usize,
) -> usize {
    if len == 0 {
        return 0;
    }
    let key = format!("{kind}|{category}|{}", canonical_serialization(data));
    (stable_hash(&key) % len as u64) as usize
}

/// Pick the phrasing variant for one section of one input.
pub fn select_pattern<'a>(
    catalogue: &'a PatternCatalogue,
    kind: SectionKind,
    category: ContentType,
    data: &BTreeMap<String, String>,
) -> Option<&'a PatternVariant> {
    let variants = catalogue.variants(category, kind);
    variants.get(select_index(kind, category, data, variants.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_canonical_serialization_is_order_independent() {
        let mut a = BTreeMap::new();
        a.insert("z".to_string(), "1".to_string());
        a.insert("a".to_string(), "2".to_string());
        let b = data(&[("a", "2"), ("z", "1")]);
        assert_eq!(canonical_serialization(&a), canonical_serialization(&b));
        assert_eq!(canonical_serialization(&b), r#"{"a":"2","z":"1"}"#);
    }

    #[test]
    fn test_same_input_same_variant() {
        let catalogue = PatternCatalogue::builtin().unwrap();
        let input = data(&[("service", "Plumbing"), ("city", "Austin")]);
        let first = select_pattern(
            &catalogue,
            SectionKind::Introduction,
            ContentType::LocationService,
            &input,
        )
        .unwrap();
        for _ in 0..10 {
            let again = select_pattern(
                &catalogue,
                SectionKind::Introduction,
                ContentType::LocationService,
                &input,
            )
            .unwrap();
            assert_eq!(first.id, again.id);
        }
    }

    #[test]
    fn test_spread_over_many_inputs() {
        let len = 3;
        let mut counts = vec![0usize; len];
        for i in 0..1000 {
            let input = data(&[("city", &format!("city-{i}"))]);
            counts[select_index(SectionKind::MainValue, ContentType::Generic, &input, len)] += 1;
        }
        let expected = 1000 / len;
        for count in counts {
            assert!(count > 0 && count <= expected * 2, "count {count}");
        }
    }

    #[test]
    fn test_empty_catalogue_selects_nothing() {
        let catalogue = PatternCatalogue::default();
        let input = data(&[("city", "Austin")]);
        assert!(select_pattern(&catalogue, SectionKind::Faq, ContentType::Generic, &input).is_none());
        assert_eq!(select_index(SectionKind::Faq, ContentType::Generic, &input, 0), 0);
    }
}
