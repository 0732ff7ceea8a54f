//! 📅 Solr dates — one canonical string, however the timestamp showed up.
//!
//! Solr wants `YYYY-MM-DDTHH:MM:SSZ`, in UTC, with fractional seconds only when
//! they exist. Callers want to hand us `DateTime<Utc>`, RFC 3339 strings with
//! offsets, naive timestamps, and bare dates. This module makes peace between them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{SolrError, SolrResult};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// 📅 The wire format: UTC, `Z` suffix, sub-second digits only when non-zero.
pub fn to_solr_date(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// 🔍 Parses the date-like strings we accept. Naive inputs are taken as UTC.
pub fn parse_solr_date(raw: &str) -> SolrResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        // -- 🕛 a bare date means midnight. UTC midnight. The only midnight Solr knows.
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(SolrError::validation(format!(
        "'{raw}' does not look like a date Solr would accept"
    )))
}

/// 🔄 Canonicalize a raw string: parse whatever it is, print it the Solr way.
pub fn canonicalize(raw: &str) -> SolrResult<String> {
    parse_solr_date(raw).map(|dt| to_solr_date(&dt))
}
