use dupescan::engine::numeric_sort;

// --- plain text ---

#[test]
fn test_equal_strings() {
    assert_eq!(numeric_sort(b"abc", b"abc", 1), 0);
}

#[test]
fn test_case_insensitive_letter_order() {
    // Byte order would put 'B' before 'a'; case-folded order does not.
    assert_eq!(numeric_sort(b"B", b"a", 1), 1);
    assert_eq!(numeric_sort(b"a", b"B", 1), -1);
}

#[test]
fn test_prefix_sorts_first() {
    assert_eq!(numeric_sort(b"abc", b"abcd", 1), -1);
    assert_eq!(numeric_sort(b"abcd", b"abc", 1), 1);
}

// --- numeric runs ---

#[test]
fn test_numeric_comparison() {
    assert_eq!(numeric_sort(b"file2", b"file10", 1), -1);
    assert_eq!(numeric_sort(b"file10", b"file2", 1), 1);
    assert_eq!(numeric_sort(b"file10", b"file10", 1), 0);
}

#[test]
fn test_leading_zeros_equal_value() {
    // Equal numeric value; the run with more leading zeros is longer and
    // sorts later.
    assert_eq!(numeric_sort(b"a007b", b"a7b", 1), 1);
    assert_eq!(numeric_sort(b"a7b", b"a007b", 1), -1);
}

#[test]
fn test_number_vs_longer_number() {
    assert_eq!(numeric_sort(b"a123", b"a1234", 1), -1);
    assert_eq!(numeric_sort(b"a1234", b"a123", 1), 1);
}

#[test]
fn test_numbers_embedded_in_text() {
    assert_eq!(numeric_sort(b"img9.png", b"img10.png", 1), -1);
    assert_eq!(numeric_sort(b"v1.2.10", b"v1.2.9", 1), 1);
}

// --- symbols ---

#[test]
fn test_symbols_sort_after_letters() {
    // '!' < '.' in ASCII but sorts after letters here.
    assert_eq!(numeric_sort(b"a!", b"ab", 1), 1);
    assert_eq!(numeric_sort(b"ab", b"a!", 1), -1);
}

// --- direction ---

#[test]
fn test_reverse_direction_flips_result() {
    assert_eq!(numeric_sort(b"file2", b"file10", -1), 1);
    assert_eq!(numeric_sort(b"abd", b"abc", -1), -1);
    assert_eq!(numeric_sort(b"same", b"same", -1), 0);
}
