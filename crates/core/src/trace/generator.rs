//! Synthetic access pattern generators.
//!
//! Every generator returns a materialized, ordered `Vec<Transaction>` so the
//! distributor can size and index it. Arithmetic is done in `u64` throughout;
//! the largest address of a pattern is checked before anything is generated.
//! It provides:
//! 1. **Sequential:** Burst-aligned linear sweep over a buffer.
//! 2. **Column-wise / cube-wise:** Gather of elements spread at a fixed stride.
//! 3. **Strided / indexed:** Word-granular strides used for stride sweeps and trace files.

use crate::common::{ConfigError, Transaction};

/// Element stride of a column-major traversal of a 512 x 512 plane.
pub const COLUMN_STRIDE: u64 = 1 << 9;

/// Element stride of a cube-major traversal (one full 512 x 512 plane).
pub const CUBE_STRIDE: u64 = 1 << 18;

/// Shift converting a word index into a byte address for 32-byte words.
pub const WORD_SHIFT: u32 = 5;

/// Largest number of requests a single generator call materializes.
pub const MAX_REQUESTS: u64 = 1 << 32;

fn require_nonzero(name: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidParameter {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Unwraps a checked arithmetic result, blaming `name` on overflow.
pub(crate) fn checked(name: &'static str, value: Option<u64>) -> Result<u64, ConfigError> {
    value.ok_or_else(|| ConfigError::InvalidParameter {
        name,
        reason: "address arithmetic overflows 64 bits".to_string(),
    })
}

/// Validates a request count against `MAX_REQUESTS`.
pub(crate) fn request_count(name: &'static str, count: Option<u64>) -> Result<usize, ConfigError> {
    let count = checked(name, count)?;
    match usize::try_from(count) {
        Ok(n) if count <= MAX_REQUESTS => Ok(n),
        _ => Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{count} requests exceed the limit of {MAX_REQUESTS}"),
        }),
    }
}

/// `word << shift`, or `None` if any bit would be shifted out.
pub(crate) fn word_address(word: u64, shift: u32) -> Option<u64> {
    word.checked_mul(1u64.checked_shl(shift)?)
}

/// Linear sweep of `num_elements * element_size` bytes in burst-sized requests.
///
/// # Arguments
///
/// * `start` - Byte address of the first request.
/// * `num_elements` - Number of logical elements covered.
/// * `element_size` - Element size in bytes.
/// * `burst_size` - Bytes moved per request; must be non-zero.
/// * `is_write` - Direction of every request.
///
/// # Returns
///
/// `(num_elements * element_size) / burst_size` transactions at
/// `start + i * burst_size`.
pub fn sequential(
    start: u64,
    num_elements: u64,
    element_size: u64,
    burst_size: u64,
    is_write: bool,
) -> Result<Vec<Transaction>, ConfigError> {
    require_nonzero("burst_size", burst_size)?;
    let bytes = checked("num_elements", num_elements.checked_mul(element_size))?;
    let count = bytes / burst_size;
    let _ = request_count("num_elements", Some(count))?;
    let _ = checked(
        "start",
        start.checked_add(count.saturating_sub(1) * burst_size),
    )?;
    Ok((0..count)
        .map(|i| Transaction::new(start + i * burst_size, is_write))
        .collect())
}

/// Gather/scatter of elements placed `stride` elements apart.
///
/// When several strided elements fit in one burst they are fetched together:
/// the stride and element count are scaled by the number of elements per
/// burst. Each resulting row issues `ceil(element_size / burst_size)` requests
/// at consecutive offsets from the row base.
///
/// # Arguments
///
/// * `start` - Byte address of the first element.
/// * `num_elements` - Number of logical elements.
/// * `stride` - Distance between elements, in elements; must be non-zero.
/// * `element_size` - Element size in bytes; must be non-zero.
/// * `burst_size` - Bytes moved per request; must be non-zero.
/// * `is_write` - Direction of every request.
pub fn columnwise(
    start: u64,
    num_elements: u64,
    stride: u64,
    element_size: u64,
    burst_size: u64,
    is_write: bool,
) -> Result<Vec<Transaction>, ConfigError> {
    require_nonzero("stride", stride)?;
    require_nonzero("element_size", element_size)?;
    require_nonzero("burst_size", burst_size)?;

    let elements_in_burst = burst_size.div_ceil(checked("stride", element_size.checked_mul(stride))?);
    let stride = checked("stride", stride.checked_mul(elements_in_burst))?;
    let rows = num_elements.div_ceil(elements_in_burst);

    let requests_per_element = element_size.div_ceil(burst_size);
    let stride_size = checked("stride", stride.checked_mul(element_size))?;

    let len = request_count("num_elements", rows.checked_mul(requests_per_element))?;
    let last_row = checked("stride", rows.saturating_sub(1).checked_mul(stride_size))?;
    let _ = checked(
        "start",
        start
            .checked_add(last_row)
            .and_then(|a| a.checked_add(requests_per_element.saturating_sub(1))),
    )?;

    let mut trace = Vec::with_capacity(len);
    for row in 0..rows {
        for burst in 0..requests_per_element {
            trace.push(Transaction::new(start + row * stride_size + burst, is_write));
        }
    }
    Ok(trace)
}

/// Column-major traversal of a 512 x 512 plane of elements.
pub fn column_access(
    start: u64,
    num_elements: u64,
    element_size: u64,
    burst_size: u64,
    is_write: bool,
) -> Result<Vec<Transaction>, ConfigError> {
    columnwise(start, num_elements, COLUMN_STRIDE, element_size, burst_size, is_write)
}

/// Cube-major traversal: one element per 512 x 512 plane.
pub fn cube_access(
    start: u64,
    num_elements: u64,
    element_size: u64,
    burst_size: u64,
    is_write: bool,
) -> Result<Vec<Transaction>, ConfigError> {
    columnwise(start, num_elements, CUBE_STRIDE, element_size, burst_size, is_write)
}

/// One request per 32-byte word, `stride` words apart: `start + ((i * stride) << 5)`.
pub fn strided(
    start: u64,
    stride: u64,
    elements: u64,
    is_write: bool,
) -> Result<Vec<Transaction>, ConfigError> {
    let _ = request_count("elements", Some(elements))?;
    let last_word = checked("stride", elements.saturating_sub(1).checked_mul(stride))?;
    let last_offset = checked("stride", word_address(last_word, WORD_SHIFT))?;
    let _ = checked("start", start.checked_add(last_offset))?;
    Ok((0..elements)
        .map(|i| Transaction::new(start + ((i * stride) << WORD_SHIFT), is_write))
        .collect())
}

/// Element-indexed stride pattern written to trace files by `dramtrace generate`.
///
/// Address `i` is `(start_idx + i * 2^stride_exp) * element_size`.
pub fn indexed_stride(
    start_idx: u64,
    stride_exp: u32,
    count: u64,
    element_size: u64,
    is_write: bool,
) -> Result<Vec<Transaction>, ConfigError> {
    if stride_exp >= u64::BITS {
        return Err(ConfigError::InvalidParameter {
            name: "stride_exp",
            reason: format!("{stride_exp} exceeds the 64-bit address width"),
        });
    }
    let stride = 1u64 << stride_exp;
    let _ = request_count("count", Some(count))?;
    let last_index = checked(
        "start_idx",
        count
            .saturating_sub(1)
            .checked_mul(stride)
            .and_then(|offset| start_idx.checked_add(offset)),
    )?;
    let _ = checked("element_size", last_index.checked_mul(element_size))?;
    Ok((0..count)
        .map(|i| Transaction::new((start_idx + i * stride) * element_size, is_write))
        .collect())
}
