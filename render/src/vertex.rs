use std::mem::size_of;

use anyhow::Context as _;
use gl::Apier;

const FLOAT_SIZE: usize = size_of::<f32>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub index: gl::GLuint,
    /// number of f32 components, 1..=4.
    pub components: u8,
    pub normalized: bool,
    /// in bytes, from the start of a vertex.
    pub offset: usize,
}

/// describes how a flat `[f32]` array is carved into vertices.
///
/// nothing ties the description to the data: it is up to the caller to keep both in agreement.
/// debug builds check what can be checked at upload time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub attributes: Vec<VertexAttribute>,
    /// in bytes.
    pub stride: usize,
    pub vertex_count: usize,
}

impl VertexLayout {
    /// `vec3` position at location 0.
    pub fn position(data: &[f32]) -> Self {
        Self::interleaved(data, &[3])
    }

    /// `vec3` position at location 0 followed by a `vec3` color at location 1.
    pub fn position_color(data: &[f32]) -> Self {
        Self::interleaved(data, &[3, 3])
    }

    /// tightly packed attributes, in order, at consecutive locations.
    pub fn interleaved(data: &[f32], components: &[u8]) -> Self {
        let mut attributes = Vec::with_capacity(components.len());
        let mut offset = 0;
        for (index, &count) in components.iter().enumerate() {
            attributes.push(VertexAttribute {
                index: index as gl::GLuint,
                components: count,
                normalized: false,
                offset,
            });
            offset += count as usize * FLOAT_SIZE;
        }
        let floats_per_vertex = offset / FLOAT_SIZE;
        Self {
            attributes,
            stride: offset,
            vertex_count: data.len().checked_div(floats_per_vertex).unwrap_or(0),
        }
    }

    fn debug_check(&self, data: &[f32]) {
        debug_assert!(self.stride > 0, "zero stride");
        debug_assert_eq!(
            (data.len() * FLOAT_SIZE) % self.stride,
            0,
            "data is not a whole number of vertices"
        );
        debug_assert!(
            self.vertex_count * self.stride <= data.len() * FLOAT_SIZE,
            "vertex count exceeds data"
        );
        for attr in self.attributes.iter() {
            debug_assert!((1..=4).contains(&attr.components));
            debug_assert!(
                attr.offset + attr.components as usize * FLOAT_SIZE <= self.stride,
                "attribute {} lies outside of the stride",
                attr.index
            );
        }
    }
}

pub struct VertexBuffer<A: Apier> {
    buffer: A::Buffer,
    vertex_array: A::VertexArray,
    layout: VertexLayout,
}

impl<A: Apier> VertexBuffer<A> {
    pub fn buffer(&self) -> A::Buffer {
        self.buffer
    }

    pub fn vertex_array(&self) -> A::VertexArray {
        self.vertex_array
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> usize {
        self.layout.vertex_count
    }

    pub fn bind(&self, api: &A) {
        unsafe {
            api.bind_vertex_array(Some(self.vertex_array));
            api.bind_buffer(gl::ARRAY_BUFFER, Some(self.buffer));
        }
    }

    pub fn destroy(self, api: &A) {
        unsafe {
            api.delete_buffer(self.buffer);
            api.delete_vertex_array(self.vertex_array);
        }
    }
}

/// uploads `data` once (static usage) and records `layout` into a fresh vertex array, which stays
/// bound.
pub fn upload_vertices<A: Apier>(
    api: &A,
    data: &[f32],
    layout: VertexLayout,
) -> anyhow::Result<VertexBuffer<A>> {
    layout.debug_check(data);

    unsafe {
        let vertex_array = api
            .create_vertex_array()
            .context("could not create vertex array")?;
        api.bind_vertex_array(Some(vertex_array));

        let buffer = match api.create_buffer().context("could not create buffer") {
            Ok(buffer) => buffer,
            Err(err) => {
                api.delete_vertex_array(vertex_array);
                return Err(err);
            }
        };
        api.bind_buffer(gl::ARRAY_BUFFER, Some(buffer));
        api.buffer_data(
            gl::ARRAY_BUFFER,
            bytemuck::cast_slice(data),
            gl::STATIC_DRAW,
        );

        for attr in layout.attributes.iter() {
            api.vertex_attrib_pointer(
                attr.index,
                attr.components as gl::GLint,
                gl::FLOAT,
                if attr.normalized { gl::TRUE } else { gl::FALSE },
                layout.stride as gl::GLsizei,
                attr.offset as gl::GLint,
            );
            api.enable_vertex_attrib_array(attr.index);
        }

        log::debug!(
            "uploaded {} vertices ({} bytes, stride {})",
            layout.vertex_count,
            size_of_val(data),
            layout.stride
        );

        Ok(VertexBuffer {
            buffer,
            vertex_array,
            layout,
        })
    }
}
