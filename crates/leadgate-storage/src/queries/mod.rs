// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table.

pub mod interactions;
pub mod leads;
pub mod messages;
pub mod visitors;

/// Parse a TEXT column into an enum, reporting a conversion failure with the
/// column index on bad data.
pub(crate) fn parse_column<T: std::str::FromStr>(
    idx: usize,
    raw: &str,
) -> Result<T, rusqlite::Error> {
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unrecognized value `{raw}`").into(),
        )
    })
}
