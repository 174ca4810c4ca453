use std::mem;

use gl::{self, types::*};
use glam::{Mat4, Vec2, Vec3};

use crate::error::{Error, Result};
use crate::shader::Shader;
use crate::texture::{Texture, TextureRole};

/// Interleaved vertex layout: position, normal, UV. 32 bytes per vertex.
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

/// A drawable primitive: one vertex/index buffer pair plus the cache-owned
/// textures its material references. Immutable once constructed; the GPU
/// buffers live exactly as long as the `Mesh`.
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<Texture>,

    vao: GLuint,
    vbo: GLuint,
    ebo: GLuint,
}

impl Mesh {
    /// Uploads the vertex and index buffers and configures the attribute
    /// layout. Needs a current GL context.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, textures: Vec<Texture>) -> Result<Mesh> {
        debug_assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));

        let mut vao = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
        }
        if vao == 0 {
            return Err(Error::GpuResource(
                "glGenVertexArrays returned no name".to_owned(),
            ));
        }

        let (mut vbo, mut ebo) = (0, 0);
        unsafe {
            gl::BindVertexArray(vao);

            gl::GenBuffers(1, &mut vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
        }

        // 3 for the position
        // 3 for the normal
        // 2 for the UV
        let floats_per_vert = 3 + 3 + 2;

        let mut buf: Vec<f32> = Vec::with_capacity(vertices.len() * floats_per_vert);

        for vert in &vertices {
            buf.push(vert.position.x);
            buf.push(vert.position.y);
            buf.push(vert.position.z);

            buf.push(vert.normal.x);
            buf.push(vert.normal.y);
            buf.push(vert.normal.z);

            buf.push(vert.uv.x);
            buf.push(vert.uv.y);
        }

        unsafe {
            gl::BufferData(
                gl::ARRAY_BUFFER,
                (buf.len() * mem::size_of::<f32>()) as _,
                buf.as_ptr() as _,
                gl::STATIC_DRAW,
            );
        }

        let stride = (floats_per_vert * mem::size_of::<f32>()) as GLsizei;

        unsafe {
            gl::VertexAttribPointer(
                0,
                3,
                gl::FLOAT,
                gl::FALSE,
                stride,
                (0 * mem::size_of::<f32>()) as _,
            );
            gl::EnableVertexAttribArray(0);

            gl::VertexAttribPointer(
                1,
                3,
                gl::FLOAT,
                gl::FALSE,
                stride,
                (3 * mem::size_of::<f32>()) as _,
            );
            gl::EnableVertexAttribArray(1);

            gl::VertexAttribPointer(
                2,
                2,
                gl::FLOAT,
                gl::FALSE,
                stride,
                (6 * mem::size_of::<f32>()) as _,
            );
            gl::EnableVertexAttribArray(2);
        }

        unsafe {
            gl::GenBuffers(1, &mut ebo);
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ebo);
            gl::BufferData(
                gl::ELEMENT_ARRAY_BUFFER,
                (indices.len() * mem::size_of::<u32>()) as _,
                indices.as_ptr() as _,
                gl::STATIC_DRAW,
            );

            // VAO first; unbinding the EBO earlier would detach it.
            gl::BindVertexArray(0);

            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, 0);
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
        }

        Ok(Mesh {
            vertices,
            indices,
            textures,
            vao,
            vbo,
            ebo,
        })
    }

    /// Binds each texture to the unit matching its position in the texture
    /// list, naming samplers `material.texture_<role><n>` with independent
    /// 1-based counters per role, sets `model`, and issues one indexed
    /// triangle-list draw over the whole index buffer.
    ///
    /// Mutates global bind state (active texture unit, bound VAO); callers
    /// must not assume bindings survive the call.
    pub fn draw(&self, shader: &Shader, transform: Mat4) {
        shader.use_program();

        let names = sampler_names(self.textures.iter().map(|tex| tex.role));

        for (unit, (tex, name)) in self.textures.iter().zip(&names).enumerate() {
            shader.set_i32(name, unit as i32);

            unsafe {
                gl::ActiveTexture(gl::TEXTURE0 + unit as GLenum);
                gl::BindTexture(gl::TEXTURE_2D, tex.id);
            }
        }

        unsafe {
            gl::ActiveTexture(gl::TEXTURE0);
        }

        shader.set_mat4("model", transform);

        unsafe {
            gl::BindVertexArray(self.vao);
            gl::DrawElements(
                gl::TRIANGLES,
                self.indices.len() as _,
                gl::UNSIGNED_INT,
                0 as _,
            );
            gl::BindVertexArray(0);
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        // Buffers only. Texture ids belong to the cache.
        unsafe {
            gl::DeleteVertexArrays(1, &self.vao);
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteBuffers(1, &self.ebo);
        }
    }
}

/// Sampler uniform names for a sequence of texture roles, in order. Each
/// role counts up from 1 on its own.
fn sampler_names<I>(roles: I) -> Vec<String>
where
    I: Iterator<Item = TextureRole>,
{
    let mut diffuse_n = 0;
    let mut specular_n = 0;

    roles
        .map(|role| {
            let n = match role {
                TextureRole::Diffuse => {
                    diffuse_n += 1;
                    diffuse_n
                }
                TextureRole::Specular => {
                    specular_n += 1;
                    specular_n
                }
            };

            format!("material.{}{}", role.sampler_stem(), n)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    use super::TextureRole::{Diffuse, Specular};

    #[test]
    fn sampler_counters_are_per_role_and_one_based() {
        let names = sampler_names([Diffuse, Specular, Specular, Diffuse].iter().copied());

        assert_eq!(
            names,
            vec![
                "material.texture_diffuse1",
                "material.texture_specular1",
                "material.texture_specular2",
                "material.texture_diffuse2",
            ]
        );
    }

    #[test]
    fn no_textures_means_no_sampler_names() {
        assert!(sampler_names([].iter().copied()).is_empty());
    }
}
