#[macro_export]
/// Truncate long strings for logging and error messages purpose.
///
/// Returns a `format_args!` that yields at most 497 characters from the start
/// of the input followed by `...` when truncation occurred.
macro_rules! truncate_long {
    ($text:expr) => {
        format_args!(
            "{}{}",
            &$text[..::std::cmp::min($text.len(), 497)].trim(),
            if $text.len() > 497 { "..." } else { "" },
        )
    };
}
