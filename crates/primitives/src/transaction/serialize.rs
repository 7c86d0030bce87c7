// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Canonical serialization of arbitrary payload JSON for transaction
//! hashing. Objects render as `{k.v.k.v}` with keys in ascending order,
//! arrays as `[v.v]`, `null` as `\0`; the delimiter characters
//! `\ . { } [ ]` inside strings are escaped with a backslash.

use serde_json::Value;

const ESCAPED: &[u8] = br"\.{}[]";

pub fn serialize_value(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.extend_from_slice(br"\0"),
        Value::Bool(flag) => {
            out.extend_from_slice(if *flag { b"true" } else { b"false" })
        }
        Value::Number(num) => out.extend_from_slice(num.to_string().as_bytes()),
        Value::String(text) => write_escaped(text, out),
        Value::Array(items) => {
            out.push(b'[');
            for (position, item) in items.iter().enumerate() {
                if position > 0 {
                    out.push(b'.');
                }
                write_value(item, out);
            }
            out.push(b']');
        }
        Value::Object(entries) => {
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            out.push(b'{');
            for (position, key) in keys.into_iter().enumerate() {
                if position > 0 {
                    out.push(b'.');
                }
                write_escaped(key, out);
                out.push(b'.');
                write_value(&entries[key], out);
            }
            out.push(b'}');
        }
    }
}

fn write_escaped(text: &str, out: &mut Vec<u8>) {
    for byte in text.bytes() {
        if ESCAPED.contains(&byte) {
            out.push(b'\\');
        }
        out.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::serialize_value;
    use serde_json::json;

    fn text(value: serde_json::Value) -> String {
        String::from_utf8(serialize_value(&value)).unwrap()
    }

    #[test]
    fn object_keys_are_sorted() {
        let value = json!({
            "method": "transfer",
            "params": { "to": "hx5bfdb090f43a808005ffc27c25b213145e80b7cd", "amount": "0x1" },
        });
        assert_eq!(
            text(value),
            "{method.transfer.params.{amount.0x1.to.hx5bfdb090f43a808005ffc27c25b213145e80b7cd}}"
        );
    }

    #[test]
    fn delimiters_are_escaped() {
        assert_eq!(text(json!("a.b")), "a\\.b");
        assert_eq!(text(json!("x[y]")), "x\\[y\\]");
        assert_eq!(text(json!({ "k": null })), "{k.\\0}");
    }

    #[test]
    fn arrays_join_with_dots() {
        assert_eq!(text(json!(["0x1", "0x2"])), "[0x1.0x2]");
    }
}
