// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ZIP packaging of converted images. Entries are stored uncompressed, since
// encoded images gain nothing from deflate.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use bildwerk_core::error::{BildwerkError, Result};
use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Pack `(name, bytes)` entries into an in-memory ZIP archive, in order.
///
/// Repeated names get a ` (n)` suffix before the extension so that no entry
/// overwrites another.
#[instrument(skip(entries), fields(entries = entries.len()))]
pub fn build_archive(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    if entries.is_empty() {
        return Err(BildwerkError::EmptyInput("no converted images to archive".into()));
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut used = HashSet::with_capacity(entries.len());

    for (name, data) in entries {
        let entry_name = unique_name(name, &used);
        debug!(%entry_name, bytes = data.len(), "Adding archive entry");
        zip.start_file(entry_name.as_str(), options)
            .map_err(|err| BildwerkError::Archive(format!("failed to add {entry_name}: {err}")))?;
        zip.write_all(data)?;
        used.insert(entry_name);
    }

    let bytes = zip
        .finish()
        .map_err(|err| BildwerkError::Archive(format!("failed to finish archive: {err}")))?
        .into_inner();
    info!(bytes = bytes.len(), "Archive built");
    Ok(bytes)
}

/// `name`, or `name` with the first free ` (n)` suffix before its extension.
pub fn unique_name(name: &str, used: &HashSet<String>) -> String {
    if !used.contains(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };
    (1..)
        .map(|n| format!("{stem} ({n}){ext}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}
