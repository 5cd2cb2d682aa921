use std::marker::PhantomData;

/// Rounds `size` up to the next multiple of `alignment`
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// Uniform buffer holding many `Content` blocks, one per dynamic offset
///
/// Each block starts on a multiple of the device's uniform offset alignment.
/// The buffer grows (and is recreated) when more slots are written than it
/// can hold; callers rebuild their bind groups when [`write`](Self::write)
/// reports that.
pub struct DynamicUniformBuffer<Content> {
    buffer: wgpu::Buffer,
    stride: u64,
    capacity: usize,
    scratch: Vec<u8>,
    content_type: PhantomData<Content>,
}

impl<Content: bytemuck::Pod> DynamicUniformBuffer<Content> {
    fn name() -> &'static str {
        let type_name = std::any::type_name::<Content>();
        let pos = type_name.rfind(':').unwrap_or(0);
        if pos > 0 {
            &type_name[(pos + 1)..]
        } else {
            type_name
        }
    }

    fn create_buffer(device: &wgpu::Device, stride: u64, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("DynamicUniformBuffer: {}", Self::name())),
            size: stride * capacity.max(1) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = aligned_stride(std::mem::size_of::<Content>() as u64, alignment);
        Self {
            buffer: Self::create_buffer(device, stride, capacity),
            stride,
            capacity: capacity.max(1),
            scratch: Vec::new(),
            content_type: PhantomData,
        }
    }

    /// Dynamic offset of slot `index`
    pub fn offset(&self, index: usize) -> u32 {
        (self.stride * index as u64) as u32
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Writes `contents` into consecutive slots starting at `first`; returns
    /// true when the buffer had to be recreated
    pub fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        first: usize,
        contents: &[Content],
    ) -> bool {
        if contents.is_empty() {
            return false;
        }

        let needed = first + contents.len();
        let grown = needed > self.capacity;
        if grown {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::create_buffer(device, self.stride, self.capacity);
        }

        let stride = self.stride as usize;
        self.scratch.clear();
        self.scratch.resize(stride * contents.len(), 0);
        for (slot, content) in self.scratch.chunks_exact_mut(stride).zip(contents) {
            let bytes = bytemuck::bytes_of(content);
            slot[..bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(&self.buffer, self.stride * first as u64, &self.scratch);
        grown
    }

    /// One block's worth of the buffer, for a dynamic-offset bind group
    pub fn binding_resource(&self) -> wgpu::BindingResource {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(std::mem::size_of::<Content>() as u64),
        })
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}
