//! Parser for cast receiver TXT records.
//!
//! Each TXT string is a `key=value` pair describing the device, e.g. `id`
//! (device uuid), `md` (model name) and `fn` (friendly name). Strings that
//! are not `key=value` pairs are skipped.

use std::collections::BTreeMap;

use nom::alphanumeric;
use nom::types::CompleteStr;

named!(entry<CompleteStr, (CompleteStr, CompleteStr)>,
    do_parse!(
        key: alphanumeric >>
        char!('=') >>
        value: take_while!(call!(|_| true)) >>
        (key, value)
    )
);

/// Collect the `key=value` pairs of a TXT record. Later duplicates win.
pub fn parse<T: AsRef<str>>(strings: &[T]) -> BTreeMap<String, String> {
    strings
        .iter()
        .filter_map(|txt| entry(CompleteStr(txt.as_ref())).ok())
        .map(|(_, (key, value))| (key.as_ref().to_owned(), value.as_ref().to_owned()))
        .collect()
}
