//! Text extraction from corpus sources.
//!
//! Structured records are JSON documents shaped like
//! `{"body": [{"text": "...", ...}, ...], ...}`. Only `body[*].text` is
//! read; every other field is skipped by the deserializer without being
//! materialized, so heavy annotation payloads cost no allocations.

use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

use super::{SourceFile, SourceKind};
use crate::error::ExtractError;

/// Extract the whole text of a source into memory.
///
/// The combiner streams plain-text sources instead of calling this; it is
/// the single-shot form of the same contract.
pub fn extract_text(source: &SourceFile) -> Result<String, ExtractError> {
    match source.kind {
        SourceKind::PlainText => {
            let bytes = fs::read(&source.path).map_err(|e| ExtractError::Read {
                path: source.path.clone(),
                source: e,
            })?;
            String::from_utf8(bytes).map_err(|_| ExtractError::Decode {
                path: source.path.clone(),
            })
        }
        SourceKind::StructuredRecord => extract_structured(&source.path),
    }
}

/// Extract the `body[*].text` blocks of a structured record, joined by `\n`.
///
/// Returns an empty string when there is no `body` array or no sub-record
/// carries a string `text`.
pub fn extract_structured(path: &Path) -> Result<String, ExtractError> {
    let file = File::open(path).map_err(|e| ExtractError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let record: Record = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        if e.is_io() {
            ExtractError::Read {
                path: path.to_path_buf(),
                source: e.into(),
            }
        } else {
            ExtractError::Malformed {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    Ok(record.texts.join("\n"))
}

/// Parse a structured record from memory, returning its text blocks in
/// body order.
pub fn text_blocks(content: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str::<Record>(content).map(|record| record.texts)
}

/// The only view of a record the pipeline ever builds.
struct Record {
    texts: Vec<String>,
}

struct Body(Vec<String>);

struct BodyLine(Option<String>);

struct TextField(Option<String>);

// Values of an unexpected JSON type are treated as absent rather than as
// errors, so only syntactically broken documents fail extraction.
macro_rules! accept_any_scalar {
    ($absent:expr) => {
        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok($absent)
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
            Ok($absent)
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
            Ok($absent)
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Ok($absent)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok($absent)
        }
    };
}

fn drain_seq<'de, A: SeqAccess<'de>>(mut seq: A) -> Result<(), A::Error> {
    while seq.next_element::<IgnoredAny>()?.is_some() {}
    Ok(())
}

fn drain_map<'de, A: MapAccess<'de>>(mut map: A) -> Result<(), A::Error> {
    while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
    Ok(())
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a structured record")
            }

            accept_any_scalar!(Record { texts: Vec::new() });

            fn visit_str<E: de::Error>(self, _: &str) -> Result<Record, E> {
                Ok(Record { texts: Vec::new() })
            }

            fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Record, A::Error> {
                drain_seq(seq)?;
                Ok(Record { texts: Vec::new() })
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
                let mut texts = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    if key == "body" {
                        texts = map.next_value::<Body>()?.0;
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(Record { texts })
            }
        }

        deserializer.deserialize_any(RecordVisitor)
    }
}

impl<'de> Deserialize<'de> for Body {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BodyVisitor;

        impl<'de> Visitor<'de> for BodyVisitor {
            type Value = Body;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of body lines")
            }

            accept_any_scalar!(Body(Vec::new()));

            fn visit_str<E: de::Error>(self, _: &str) -> Result<Body, E> {
                Ok(Body(Vec::new()))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Body, A::Error> {
                drain_map(map)?;
                Ok(Body(Vec::new()))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Body, A::Error> {
                let mut texts = Vec::new();
                while let Some(BodyLine(text)) = seq.next_element::<BodyLine>()? {
                    if let Some(text) = text {
                        texts.push(text);
                    }
                }
                Ok(Body(texts))
            }
        }

        deserializer.deserialize_any(BodyVisitor)
    }
}

impl<'de> Deserialize<'de> for BodyLine {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BodyLineVisitor;

        impl<'de> Visitor<'de> for BodyLineVisitor {
            type Value = BodyLine;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a body line")
            }

            accept_any_scalar!(BodyLine(None));

            fn visit_str<E: de::Error>(self, _: &str) -> Result<BodyLine, E> {
                Ok(BodyLine(None))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<BodyLine, A::Error> {
                drain_seq(seq)?;
                Ok(BodyLine(None))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<BodyLine, A::Error> {
                let mut text = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "text" {
                        text = map.next_value::<TextField>()?.0;
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(BodyLine(text))
            }
        }

        deserializer.deserialize_any(BodyLineVisitor)
    }
}

impl<'de> Deserialize<'de> for TextField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TextVisitor;

        impl<'de> Visitor<'de> for TextVisitor {
            type Value = TextField;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a text string")
            }

            accept_any_scalar!(TextField(None));

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TextField, E> {
                Ok(TextField(Some(v.to_owned())))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<TextField, E> {
                Ok(TextField(Some(v)))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<TextField, A::Error> {
                drain_seq(seq)?;
                Ok(TextField(None))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<TextField, A::Error> {
                drain_map(map)?;
                Ok(TextField(None))
            }
        }

        deserializer.deserialize_any(TextVisitor)
    }
}
