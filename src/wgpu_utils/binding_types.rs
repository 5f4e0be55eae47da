//! WGPU binding type utilities

/// Uniform buffer bound at a per-draw dynamic offset
pub fn dynamic_uniform(min_binding_size: u64) -> wgpu::BindingType {
    wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: true,
        min_binding_size: wgpu::BufferSize::new(min_binding_size),
    }
}

/// Layout with a single entry at binding 0, visible to both stages
pub fn single_entry_layout(
    device: &wgpu::Device,
    ty: wgpu::BindingType,
    label: &str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty,
            count: None,
        }],
    })
}
