use std::ffi::CString;
use std::ptr;

use gl::{self, types::*};
use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::error::{Error, Result};

/// A linked GL program. Assemble with `with_stage` and `build`; uniforms
/// are addressed by name through the typed setters, which assume the
/// program is the active one.
pub struct Shader {
    id: GLuint,
    stages: Vec<ShaderStage>,
}

impl Shader {
    pub fn new() -> Shader {
        Shader {
            id: unsafe { gl::CreateProgram() },
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: ShaderStage) -> Shader {
        unsafe {
            gl::AttachShader(self.id, stage.id);
        }
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Result<Shader> {
        unsafe {
            gl::LinkProgram(self.id);

            let mut link_status = gl::FALSE as GLint;
            gl::GetProgramiv(self.id, gl::LINK_STATUS, &mut link_status);

            if link_status != gl::TRUE as GLint {
                return Err(Error::GpuResource(program_info_log(self.id)));
            }
        }

        Ok(self)
    }

    /// Binds this program as the active one.
    pub fn use_program(&self) {
        unsafe {
            gl::UseProgram(self.id);
        }
    }

    fn location(&self, name: &str) -> GLint {
        let name = CString::new(name).expect("uniform name contains NUL");
        unsafe { gl::GetUniformLocation(self.id, name.as_ptr()) }
    }

    pub fn set_bool(&self, name: &str, val: bool) {
        unsafe {
            gl::Uniform1i(self.location(name), GLint::from(val));
        }
    }

    pub fn set_i32(&self, name: &str, val: i32) {
        unsafe {
            gl::Uniform1i(self.location(name), val);
        }
    }

    pub fn set_f32(&self, name: &str, val: f32) {
        unsafe {
            gl::Uniform1f(self.location(name), val);
        }
    }

    pub fn set_3_f32(&self, name: &str, x: f32, y: f32, z: f32) {
        unsafe {
            gl::Uniform3f(self.location(name), x, y, z);
        }
    }

    pub fn set_vec2(&self, name: &str, val: Vec2) {
        unsafe {
            gl::Uniform2f(self.location(name), val.x, val.y);
        }
    }

    pub fn set_vec3(&self, name: &str, val: Vec3) {
        unsafe {
            gl::Uniform3f(self.location(name), val.x, val.y, val.z);
        }
    }

    pub fn set_vec4(&self, name: &str, val: Vec4) {
        unsafe {
            gl::Uniform4f(self.location(name), val.x, val.y, val.z, val.w);
        }
    }

    pub fn set_mat2(&self, name: &str, val: Mat2) {
        unsafe {
            gl::UniformMatrix2fv(self.location(name), 1, gl::FALSE, val.as_ref() as _);
        }
    }

    pub fn set_mat3(&self, name: &str, val: Mat3) {
        unsafe {
            gl::UniformMatrix3fv(self.location(name), 1, gl::FALSE, val.as_ref() as _);
        }
    }

    pub fn set_mat4(&self, name: &str, val: Mat4) {
        unsafe {
            gl::UniformMatrix4fv(self.location(name), 1, gl::FALSE, val.as_ref() as _);
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteProgram(self.id);
        }
    }
}

pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

impl From<ShaderStageKind> for GLenum {
    fn from(kind: ShaderStageKind) -> Self {
        match kind {
            ShaderStageKind::Vertex => gl::VERTEX_SHADER,
            ShaderStageKind::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

/// One compiled stage, attached to a program via `Shader::with_stage`.
pub struct ShaderStage {
    id: GLuint,
}

impl ShaderStage {
    pub fn new(source: &str, kind: ShaderStageKind) -> Result<ShaderStage> {
        let source = CString::new(source.as_bytes()).expect("shader source contains NUL");

        let id = unsafe {
            let id = gl::CreateShader(kind.into());
            gl::ShaderSource(id, 1, &source.as_ptr(), ptr::null());
            gl::CompileShader(id);

            let mut compile_status = gl::FALSE as GLint;
            gl::GetShaderiv(id, gl::COMPILE_STATUS, &mut compile_status);

            if compile_status != gl::TRUE as GLint {
                return Err(Error::GpuResource(shader_info_log(id)));
            }

            id
        };

        Ok(ShaderStage { id })
    }
}

impl Drop for ShaderStage {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteShader(self.id);
        }
    }
}

fn program_info_log(id: GLuint) -> String {
    unsafe {
        let mut log_len = 0;
        gl::GetProgramiv(id, gl::INFO_LOG_LENGTH, &mut log_len);

        let mut buf = vec![0u8; (log_len as usize).saturating_sub(1)];
        gl::GetProgramInfoLog(id, log_len, ptr::null_mut(), buf.as_mut_ptr() as *mut GLchar);

        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn shader_info_log(id: GLuint) -> String {
    unsafe {
        let mut log_len = 0;
        gl::GetShaderiv(id, gl::INFO_LOG_LENGTH, &mut log_len);

        let mut buf = vec![0u8; (log_len as usize).saturating_sub(1)];
        gl::GetShaderInfoLog(id, log_len, ptr::null_mut(), buf.as_mut_ptr() as *mut GLchar);

        String::from_utf8_lossy(&buf).into_owned()
    }
}
