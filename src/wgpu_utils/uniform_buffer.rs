//! Per-draw uniform storage
//!
//! Every draw in a frame gets its own fixed-size slot in one uniform buffer
//! and binds it with a dynamic offset, so a frame costs one buffer write no
//! matter how many objects it draws.

/// CPU side of the slot buffer: uniform blocks packed at `slot_size` strides
#[derive(Debug, Clone)]
pub struct UniformSlots {
    slot_size: u64,
    bytes: Vec<u8>,
}

impl UniformSlots {
    /// `slot_size` must be a multiple of the device's
    /// `min_uniform_buffer_offset_alignment`
    pub fn new(slot_size: u64) -> Self {
        Self {
            slot_size,
            bytes: Vec::new(),
        }
    }

    /// Appends one block, returning its byte offset
    ///
    /// Blocks shorter than a slot are zero-padded; longer ones are truncated.
    pub fn push(&mut self, block: &[u8]) -> u32 {
        let offset = self.bytes.len();
        let len = block.len().min(self.slot_size as usize);
        self.bytes.extend_from_slice(&block[..len]);
        self.bytes.resize(offset + self.slot_size as usize, 0);
        offset as u32
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn slot_size(&self) -> u64 {
        self.slot_size
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.slot_size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Round `value` up to a multiple of `align`
pub fn align_to(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

/// GPU uniform buffer holding a frame's [`UniformSlots`]
pub struct DynamicUniformBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    slots: UniformSlots,
}

impl DynamicUniformBuffer {
    const INITIAL_SLOTS: u64 = 64;

    pub fn new(device: &wgpu::Device, slot_size: u64) -> Self {
        let capacity = slot_size * Self::INITIAL_SLOTS;
        Self {
            buffer: Self::create_buffer(device, capacity),
            capacity,
            slots: UniformSlots::new(slot_size),
        }
    }

    fn create_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DynamicUniformBuffer"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn slots_mut(&mut self) -> &mut UniformSlots {
        &mut self.slots
    }

    /// Writes the staged slots to the GPU
    ///
    /// Returns `true` when the buffer had to grow, in which case bind groups
    /// referencing it must be recreated.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> bool {
        let needed = self.slots.bytes().len() as u64;
        let grew = needed > self.capacity;
        if grew {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::create_buffer(device, self.capacity);
            log::debug!("uniform buffer grown to {} bytes", self.capacity);
        }
        if needed > 0 {
            queue.write_buffer(&self.buffer, 0, self.slots.bytes());
        }
        grew
    }

    /// Binding for one slot; the draw supplies the offset
    pub fn binding_resource(&self) -> wgpu::BindingResource {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(self.slots.slot_size()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_land_on_slot_boundaries() {
        let mut slots = UniformSlots::new(256);
        assert_eq!(slots.push(&[1; 208]), 0);
        assert_eq!(slots.push(&[2; 256]), 256);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.bytes()[207], 1);
        assert_eq!(slots.bytes()[208], 0);
        assert_eq!(slots.bytes()[256], 2);

        slots.clear();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(208, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
    }
}
