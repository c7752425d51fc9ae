//! Conversion between packed 32-bit ARGB words and byte-interleaved pixels.
//!
//! A pixel word stores one pixel as `0xAARRGGBB`. Byte buffers are
//! interleaved in R, G, B(, A) order, at 3 or 4 bytes per pixel.
//!
//! - [`pack`] turns words into an RGBA byte buffer (always 4 bytes per pixel).
//! - [`unpack`] turns an RGB or RGBA byte buffer back into words, detecting
//!   the channel count when none is given.
//!
//! `pack` cannot produce a 3-byte layout, so an RGB buffer that goes through
//! `unpack` and then `pack` comes back as RGBA with opaque alpha.

use std::ops::Deref;

use crate::error::{ErrorKind, PixelError};

/// Alpha used for pixels read from a 3-byte (RGB) buffer.
pub const OPAQUE_ALPHA: u8 = 0xFF;

/// Number of bytes each pixel occupies in an interleaved buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BytesPerPixel {
    /// Red, green, blue. Alpha is implicitly opaque.
    Rgb = 3,
    /// Red, green, blue, alpha.
    Rgba = 4,
}

impl BytesPerPixel {
    #[inline]
    pub fn get(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for BytesPerPixel {
    type Error = PixelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(BytesPerPixel::Rgb),
            4 => Ok(BytesPerPixel::Rgba),
            other => Err(PixelError::new(
                ErrorKind::InvalidLength,
                format!("Invalid bytes per pixel {other}: must be 3 or 4"),
            )
            .with_detail("bytesPerPixel", other)),
        }
    }
}

/// Storage used for the words returned by [`unpack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordLayout {
    /// A growable, generic sequence (`Vec<u32>`).
    #[default]
    Sequence,
    /// An exact-length fixed-width array (`Box<[u32]>`).
    FixedWidth,
}

/// Options for [`unpack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnpackOptions {
    /// Explicit channel count. Auto-detected from the buffer length when `None`.
    pub bytes_per_pixel: Option<BytesPerPixel>,
    /// Output storage.
    pub layout: WordLayout,
}

impl UnpackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes_per_pixel(mut self, bpp: BytesPerPixel) -> Self {
        self.bytes_per_pixel = Some(bpp);
        self
    }

    pub fn layout(mut self, layout: WordLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// Unpacked pixel words in the storage requested through [`WordLayout`].
///
/// Both variants hold the same values; they differ only in representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelWords {
    Sequence(Vec<u32>),
    FixedWidth(Box<[u32]>),
}

impl PixelWords {
    pub fn as_slice(&self) -> &[u32] {
        match self {
            PixelWords::Sequence(words) => words,
            PixelWords::FixedWidth(words) => words,
        }
    }

    pub fn layout(&self) -> WordLayout {
        match self {
            PixelWords::Sequence(_) => WordLayout::Sequence,
            PixelWords::FixedWidth(_) => WordLayout::FixedWidth,
        }
    }

    pub fn into_vec(self) -> Vec<u32> {
        match self {
            PixelWords::Sequence(words) => words,
            PixelWords::FixedWidth(words) => words.into_vec(),
        }
    }
}

impl Deref for PixelWords {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        self.as_slice()
    }
}

impl PartialEq<[u32]> for PixelWords {
    fn eq(&self, other: &[u32]) -> bool {
        self.as_slice() == other
    }
}

impl<const N: usize> PartialEq<[u32; N]> for PixelWords {
    fn eq(&self, other: &[u32; N]) -> bool {
        self.as_slice() == other
    }
}

/// Values that can be coerced into a pixel word.
///
/// Coercion is unsigned 32-bit truncation. Negative and out-of-range values
/// are normalized silently, never rejected.
pub trait IntoPixelWord {
    fn into_pixel_word(self) -> u32;
}

impl IntoPixelWord for u32 {
    #[inline]
    fn into_pixel_word(self) -> u32 {
        self
    }
}

impl IntoPixelWord for i32 {
    #[inline]
    fn into_pixel_word(self) -> u32 {
        self as u32
    }
}

impl IntoPixelWord for u64 {
    #[inline]
    fn into_pixel_word(self) -> u32 {
        self as u32
    }
}

impl IntoPixelWord for i64 {
    #[inline]
    fn into_pixel_word(self) -> u32 {
        self as u32
    }
}

impl IntoPixelWord for usize {
    #[inline]
    fn into_pixel_word(self) -> u32 {
        self as u32
    }
}

/// JavaScript `ToUint32`: NaN and infinities map to 0, everything else is
/// truncated toward zero and reduced modulo 2^32.
impl IntoPixelWord for f64 {
    #[inline]
    fn into_pixel_word(self) -> u32 {
        if !self.is_finite() {
            return 0;
        }
        let modulus = 4_294_967_296.0_f64;
        let wrapped = self.trunc().rem_euclid(modulus);
        wrapped as u32
    }
}

impl<T: IntoPixelWord + Copy> IntoPixelWord for &T {
    #[inline]
    fn into_pixel_word(self) -> u32 {
        (*self).into_pixel_word()
    }
}

/// Split a word into its `[r, g, b, a]` channels.
#[inline]
pub fn word_to_rgba(word: u32) -> [u8; 4] {
    [
        (word >> 16) as u8,
        (word >> 8) as u8,
        word as u8,
        (word >> 24) as u8,
    ]
}

/// Build a word from its channels.
#[inline]
pub fn rgba_to_word(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Pack pixel words into an RGBA byte buffer.
///
/// The output is `4 * words.len()` bytes long. Never fails; an empty input
/// yields an empty buffer.
///
/// # Example
///
/// ```ignore
/// use pixelite_core::pack;
///
/// assert_eq!(pack(&[0xFFFF0000u32]), vec![255, 0, 0, 255]);
/// assert_eq!(pack(&[-1i32]), vec![255, 255, 255, 255]);
/// ```
pub fn pack<W>(words: &[W]) -> Vec<u8>
where
    W: IntoPixelWord + Copy,
{
    let mut out = vec![0u8; words.len() * 4];
    write_rgba(words, &mut out);
    out
}

/// Pack pixel words into a caller-provided RGBA buffer.
///
/// # Errors
///
/// Returns `ErrorKind::InvalidLength` if `out` is not exactly
/// `4 * words.len()` bytes long.
pub fn pack_into<W>(words: &[W], out: &mut [u8]) -> Result<(), PixelError>
where
    W: IntoPixelWord + Copy,
{
    let needed = words.len() * 4;
    if out.len() != needed {
        return Err(PixelError::new(
            ErrorKind::InvalidLength,
            format!(
                "Invalid output length {}: expected {} bytes for {} pixels",
                out.len(),
                needed,
                words.len()
            ),
        )
        .with_detail("byteLength", out.len())
        .with_detail("expected", needed));
    }
    write_rgba(words, out);
    Ok(())
}

fn write_rgba<W>(words: &[W], out: &mut [u8])
where
    W: IntoPixelWord + Copy,
{
    for (&word, px) in words.iter().zip(out.chunks_exact_mut(4)) {
        px.copy_from_slice(&word_to_rgba(word.into_pixel_word()));
    }
}

/// Pick the channel count for a buffer of `len` bytes.
///
/// RGBA wins whenever the length is divisible by 4, even if it is also
/// divisible by 3.
///
/// # Errors
///
/// Returns `ErrorKind::AmbiguousLength` if `len` is divisible by neither.
pub fn detect_bytes_per_pixel(len: usize) -> Result<BytesPerPixel, PixelError> {
    if len % 4 == 0 {
        Ok(BytesPerPixel::Rgba)
    } else if len % 3 == 0 {
        Ok(BytesPerPixel::Rgb)
    } else {
        Err(PixelError::new(
            ErrorKind::AmbiguousLength,
            format!("Ambiguous buffer length {len}: must be multiple of 3 or 4"),
        )
        .with_detail("byteLength", len))
    }
}

/// Unpack an RGB or RGBA byte buffer into pixel words.
///
/// # Errors
///
/// - `ErrorKind::InvalidLength` if `bytes_per_pixel` is given and the buffer
///   length is not a multiple of it.
/// - `ErrorKind::AmbiguousLength` if no channel count is given and the length
///   is a multiple of neither 3 nor 4.
///
/// # Example
///
/// ```ignore
/// use pixelite_core::{unpack, BytesPerPixel, UnpackOptions};
///
/// let opts = UnpackOptions::new().bytes_per_pixel(BytesPerPixel::Rgb);
/// let words = unpack(&[0x11, 0x22, 0x33], opts).unwrap();
/// assert_eq!(words, [0xFF112233]);
/// ```
pub fn unpack(buffer: &[u8], options: UnpackOptions) -> Result<PixelWords, PixelError> {
    let len = buffer.len();
    let bpp = match options.bytes_per_pixel {
        Some(bpp) => {
            if len % bpp.get() != 0 {
                return Err(PixelError::new(
                    ErrorKind::InvalidLength,
                    format!(
                        "Invalid buffer length {len}: not a multiple of {}",
                        bpp.get()
                    ),
                )
                .with_detail("byteLength", len)
                .with_detail("bytesPerPixel", bpp.get()));
            }
            bpp
        }
        None => detect_bytes_per_pixel(len)?,
    };

    let words = read_words(buffer, bpp);
    Ok(match options.layout {
        WordLayout::Sequence => PixelWords::Sequence(words),
        WordLayout::FixedWidth => PixelWords::FixedWidth(words.into_boxed_slice()),
    })
}

fn read_words(buffer: &[u8], bpp: BytesPerPixel) -> Vec<u32> {
    match bpp {
        BytesPerPixel::Rgba => buffer
            .chunks_exact(4)
            .map(|px| rgba_to_word(px[0], px[1], px[2], px[3]))
            .collect(),
        BytesPerPixel::Rgb => buffer
            .chunks_exact(3)
            .map(|px| rgba_to_word(px[0], px[1], px[2], OPAQUE_ALPHA))
            .collect(),
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
