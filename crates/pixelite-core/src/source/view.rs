//! Byte-addressable views over a shared buffer.

use std::sync::Arc;

use crate::error::PixelError;

/// Element type of a typed view, named after the JavaScript constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    BigInt64,
    BigUint64,
    /// An untyped `DataView`.
    DataView,
}

impl ElementType {
    pub fn constructor_name(self) -> &'static str {
        match self {
            ElementType::Int8 => "Int8Array",
            ElementType::Uint8 => "Uint8Array",
            ElementType::Uint8Clamped => "Uint8ClampedArray",
            ElementType::Int16 => "Int16Array",
            ElementType::Uint16 => "Uint16Array",
            ElementType::Int32 => "Int32Array",
            ElementType::Uint32 => "Uint32Array",
            ElementType::Float32 => "Float32Array",
            ElementType::Float64 => "Float64Array",
            ElementType::BigInt64 => "BigInt64Array",
            ElementType::BigUint64 => "BigUint64Array",
            ElementType::DataView => "DataView",
        }
    }

    pub fn bytes_per_element(self) -> usize {
        match self {
            ElementType::Int8
            | ElementType::Uint8
            | ElementType::Uint8Clamped
            | ElementType::DataView => 1,
            ElementType::Int16 | ElementType::Uint16 => 2,
            ElementType::Int32 | ElementType::Uint32 | ElementType::Float32 => 4,
            ElementType::Float64 | ElementType::BigInt64 | ElementType::BigUint64 => 8,
        }
    }

    /// Look up an element type by constructor name. Node's `Buffer` is a
    /// `Uint8Array` subclass and maps to `Uint8`.
    pub fn from_constructor_name(name: &str) -> Option<Self> {
        let element = match name {
            "Int8Array" => ElementType::Int8,
            "Uint8Array" | "Buffer" => ElementType::Uint8,
            "Uint8ClampedArray" => ElementType::Uint8Clamped,
            "Int16Array" => ElementType::Int16,
            "Uint16Array" => ElementType::Uint16,
            "Int32Array" => ElementType::Int32,
            "Uint32Array" => ElementType::Uint32,
            "Float32Array" => ElementType::Float32,
            "Float64Array" => ElementType::Float64,
            "BigInt64Array" => ElementType::BigInt64,
            "BigUint64Array" => ElementType::BigUint64,
            "DataView" => ElementType::DataView,
            _ => return None,
        };
        Some(element)
    }
}

/// A typed view over a byte range of a larger shared buffer.
///
/// Offsets and lengths are in bytes, never in elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferView {
    buffer: Arc<[u8]>,
    element: ElementType,
    byte_offset: usize,
    byte_length: usize,
}

impl BufferView {
    /// Create a view over `byte_length` bytes starting at `byte_offset`.
    ///
    /// The window is not checked here; resolution fails if it falls outside
    /// the buffer.
    pub fn new(
        buffer: impl Into<Arc<[u8]>>,
        element: ElementType,
        byte_offset: usize,
        byte_length: usize,
    ) -> Self {
        Self {
            buffer: buffer.into(),
            element,
            byte_offset,
            byte_length,
        }
    }

    /// Create a view from an element offset and element count.
    pub fn from_elements(
        buffer: impl Into<Arc<[u8]>>,
        element: ElementType,
        element_offset: usize,
        element_count: usize,
    ) -> Self {
        let size = element.bytes_per_element();
        Self::new(
            buffer,
            element,
            element_offset.saturating_mul(size),
            element_count.saturating_mul(size),
        )
    }

    /// Create a view covering the whole buffer.
    pub fn whole(buffer: impl Into<Arc<[u8]>>, element: ElementType) -> Self {
        let buffer = buffer.into();
        let byte_length = buffer.len();
        Self::new(buffer, element, 0, byte_length)
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn constructor_name(&self) -> &'static str {
        self.element.constructor_name()
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    /// The underlying buffer, including bytes outside this view.
    pub fn buffer(&self) -> &Arc<[u8]> {
        &self.buffer
    }

    /// Number of whole elements in the view.
    pub fn len(&self) -> usize {
        self.byte_length / self.element.bytes_per_element()
    }

    pub fn is_empty(&self) -> bool {
        self.byte_length == 0
    }

    /// The bytes this view covers.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::DecodeFailed` if the window does not fit inside the
    /// underlying buffer.
    pub fn as_bytes(&self) -> Result<&[u8], PixelError> {
        self.byte_offset
            .checked_add(self.byte_length)
            .and_then(|end| self.buffer.get(self.byte_offset..end))
            .ok_or_else(|| {
                PixelError::decode_failed("TypedArray to byte buffer conversion failed")
                    .with_detail("constructor", self.constructor_name())
                    .with_detail("byteOffset", self.byte_offset)
                    .with_detail("byteLength", self.byte_length)
                    .with_detail("bufferLength", self.buffer.len())
            })
    }
}
