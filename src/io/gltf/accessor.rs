use gltf::accessor::DataType;

use crate::core::accessor::AccessorArray;
use super::decode::Err;

/// Copies the elements of `accessor` out of the loaded buffers, honoring the buffer
/// view stride. An accessor without a buffer view reads as zeros.
pub fn read_accessor(accessor: &gltf::Accessor, buffers: &[gltf::buffer::Data]) -> Result<AccessorArray, Err> {
    if accessor.sparse().is_some() {
        return Err(Err::SparseAccessor { index: accessor.index() });
    }

    let count = accessor.count();
    let components = accessor.dimensions().multiplicity();
    let data_type = accessor.data_type();

    let Some(view) = accessor.view() else {
        let len = count.checked_mul(components)
            .ok_or(Err::AccessorOutOfBounds { index: accessor.index() })?;
        return Ok(zeros(data_type, len));
    };
    let buffer = buffers.get(view.buffer().index())
        .ok_or(Err::BufferNotLoaded(view.buffer().index()))?;

    let element_size = components * data_type.size();
    let stride = view.stride().unwrap_or(element_size);
    if stride < element_size {
        return Err(Err::InvalidStride { index: accessor.index(), stride });
    }

    // count comes straight from the asset, so every step is checked
    let out_of_bounds = Err::AccessorOutOfBounds { index: accessor.index() };
    let start = view.offset().checked_add(accessor.offset()).ok_or(out_of_bounds.clone())?;
    if count > 0 {
        let view_end = view.offset().saturating_add(view.length()).min(buffer.len());
        let end = stride.checked_mul(count - 1)
            .and_then(|n| n.checked_add(start))
            .and_then(|n| n.checked_add(element_size));
        if !end.is_some_and(|end| end <= view_end) {
            return Err(out_of_bounds);
        }
    }

    let layout = Layout { start, stride, count, components };
    let data = &buffer.0[..];
    let out = match data_type {
        DataType::I8 => AccessorArray::I8(layout.read(data, i8::from_le_bytes)),
        DataType::U8 => AccessorArray::U8(layout.read(data, u8::from_le_bytes)),
        DataType::I16 => AccessorArray::I16(layout.read(data, i16::from_le_bytes)),
        DataType::U16 => AccessorArray::U16(layout.read(data, u16::from_le_bytes)),
        DataType::U32 => AccessorArray::U32(layout.read(data, u32::from_le_bytes)),
        DataType::F32 => AccessorArray::F32(layout.read(data, f32::from_le_bytes)),
    };
    Ok(out)
}

struct Layout {
    start: usize,
    stride: usize,
    count: usize,
    components: usize,
}

impl Layout {
    // bounds are checked by the caller
    fn read<T, const N: usize>(&self, data: &[u8], from_le_bytes: fn([u8; N]) -> T) -> Vec<T> {
        let mut out = Vec::with_capacity(self.count * self.components);
        for i in 0..self.count {
            let element = self.start + i * self.stride;
            for c in 0..self.components {
                let offset = element + c * N;
                let mut bytes = [0u8; N];
                bytes.copy_from_slice(&data[offset..offset + N]);
                out.push(from_le_bytes(bytes));
            }
        }
        out
    }
}

fn zeros(data_type: DataType, len: usize) -> AccessorArray {
    match data_type {
        DataType::I8 => AccessorArray::I8(vec![0; len]),
        DataType::U8 => AccessorArray::U8(vec![0; len]),
        DataType::I16 => AccessorArray::I16(vec![0; len]),
        DataType::U16 => AccessorArray::U16(vec![0; len]),
        DataType::U32 => AccessorArray::U32(vec![0; len]),
        DataType::F32 => AccessorArray::F32(vec![0.0; len]),
    }
}
