use crate::error::{Result, TallyError};
use crate::registry::Registry;

const UNIT_BASE: u64 = 1000;
const UNITS: &[&str] = &["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Roll file stats up into namespace sums and the registry total.
///
/// Sums are recomputed from scratch, so summarizing twice is harmless. A
/// total that does not fit in 64 bits aborts with [`TallyError::Overflow`].
pub fn summarize(registry: &mut Registry) -> Result<()> {
    let mut total = 0u64;
    for namespace in registry.namespaces.values_mut() {
        namespace.sum = namespace
            .files
            .values()
            .try_fold(0u64, |acc, stat| acc.checked_add(stat.sum))
            .ok_or_else(|| TallyError::overflow(format!("namespace {}", namespace.id)))?;
        total = total
            .checked_add(namespace.sum)
            .ok_or_else(|| TallyError::overflow("registry total"))?;
    }
    registry.sum = total;

    for namespace in registry.namespaces.values_mut() {
        namespace.sum_str = format_bytes(namespace.sum);
    }
    registry.sum_str = format_bytes(registry.sum);

    log::info!(
        "Total {} ({} bytes) across {} namespaces",
        registry.sum_str,
        registry.sum,
        registry.namespaces.len()
    );
    Ok(())
}

/// Human-readable size in decimal SI units (`100 B`, `1.5 kB`, `83 MB`).
///
/// Values are rounded to one decimal place; the decimal is shown only below
/// 10 units.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 10 {
        return format!("{bytes} B");
    }

    let mut exp = 0usize;
    let mut scale = 1u64;
    while exp + 1 < UNITS.len() && bytes / scale >= UNIT_BASE {
        scale *= UNIT_BASE;
        exp += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let value = ((bytes as f64 / scale as f64) * 10.0 + 0.5).floor() / 10.0;
    if value < 10.0 {
        format!("{value:.1} {}", UNITS[exp])
    } else {
        format!("{value:.0} {}", UNITS[exp])
    }
}
