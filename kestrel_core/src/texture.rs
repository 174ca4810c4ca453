use std::os::raw::c_void;
use std::path::Path;

use gl::{self, types::*};

use crate::error::{Error, Result};

mod russimp {
    pub use russimp::texture::{Texture, TextureType};
}

/// Material channel a texture feeds. Names the shader sampler it binds to.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TextureRole {
    Diffuse,
    Specular,
}

impl TextureRole {
    /// Sampler name stem, completed at draw time with a 1-based per-role
    /// counter (`texture_diffuse1`, `texture_specular2`, ...).
    pub fn sampler_stem(self) -> &'static str {
        match self {
            TextureRole::Diffuse => "texture_diffuse",
            TextureRole::Specular => "texture_specular",
        }
    }
}

impl From<TextureRole> for russimp::TextureType {
    fn from(role: TextureRole) -> Self {
        match role {
            TextureRole::Diffuse => russimp::TextureType::Diffuse,
            TextureRole::Specular => russimp::TextureType::Specular,
        }
    }
}

/// Handle to a GPU texture owned by the process-wide cache.
///
/// Cloning copies the handle, not the GPU object. There is no `Drop` impl:
/// the id is deleted exactly once, by `cache::release_all`.
#[derive(Clone, Debug)]
pub struct Texture {
    pub id: GLuint,
    pub role: TextureRole,
    /// Identity key the cache knows this texture under: the literal
    /// material reference for file textures, the embedded asset's internal
    /// filename otherwise.
    pub key: String,
}

/// Decodes `directory/reference` and uploads it. The cache key stays the
/// bare reference string; the directory is only used to read the file.
pub(crate) fn from_file(directory: &Path, reference: &str, role: TextureRole) -> Result<Texture> {
    let img = image::open(directory.join(reference)).map_err(|e| Error::TextureDecode {
        key: reference.to_owned(),
        reason: e.to_string(),
    })?;

    let (format, width, height, data) = split_channels(img);
    let id = upload(format, width, height, &data)?;

    Ok(Texture {
        id,
        role,
        key: reference.to_owned(),
    })
}

/// Decodes an in-memory blob (an embedded texture's compressed payload).
pub(crate) fn from_memory(bytes: &[u8], key: &str, role: TextureRole) -> Result<Texture> {
    let img = image::load_from_memory(bytes).map_err(|e| Error::TextureDecode {
        key: key.to_owned(),
        reason: e.to_string(),
    })?;

    let (format, width, height, data) = split_channels(img);
    let id = upload(format, width, height, &data)?;

    Ok(Texture {
        id,
        role,
        key: key.to_owned(),
    })
}

/// Embedded textures arrive either as a compressed blob (`height == 0`) to
/// run through the image decoder, or as raw BGRA texels to upload directly.
pub(crate) fn from_embedded(
    embedded: &russimp::Texture,
    key: &str,
    role: TextureRole,
) -> Result<Texture> {
    if embedded.height == 0 {
        // Texels are a view over the raw byte stream here, 4 bytes each.
        let mut bytes = Vec::with_capacity(embedded.data.len() * 4);
        for texel in &embedded.data {
            bytes.extend_from_slice(&[texel.b, texel.g, texel.r, texel.a]);
        }
        from_memory(&bytes, key, role)
    } else {
        let mut pixels = Vec::with_capacity(embedded.data.len() * 4);
        for texel in &embedded.data {
            pixels.extend_from_slice(&[texel.r, texel.g, texel.b, texel.a]);
        }
        let id = upload(gl::RGBA, embedded.width, embedded.height, &pixels)?;

        Ok(Texture {
            id,
            role,
            key: key.to_owned(),
        })
    }
}

/// 1 and 3 channel images keep their layout; everything else is widened to
/// RGBA before upload.
fn split_channels(img: image::DynamicImage) -> (GLenum, u32, u32, Vec<u8>) {
    use image::DynamicImage::*;

    match img {
        ImageLuma8(buf) => {
            let (width, height) = buf.dimensions();
            (gl::RED, width, height, buf.into_raw())
        }
        ImageRgb8(buf) => {
            let (width, height) = buf.dimensions();
            (gl::RGB, width, height, buf.into_raw())
        }
        ImageRgba8(buf) => {
            let (width, height) = buf.dimensions();
            (gl::RGBA, width, height, buf.into_raw())
        }
        other => {
            let buf = other.into_rgba8();
            let (width, height) = buf.dimensions();
            (gl::RGBA, width, height, buf.into_raw())
        }
    }
}

fn upload(format: GLenum, width: u32, height: u32, data: &[u8]) -> Result<GLuint> {
    let mut id: GLuint = 0;

    unsafe {
        gl::GenTextures(1, &mut id);
    }
    if id == 0 {
        return Err(Error::GpuResource("glGenTextures returned no name".to_owned()));
    }

    unsafe {
        gl::BindTexture(gl::TEXTURE_2D, id);

        gl::TexImage2D(
            gl::TEXTURE_2D,
            0,
            format as _,
            width as _,
            height as _,
            0,
            format,
            gl::UNSIGNED_BYTE,
            data.as_ptr() as *const c_void,
        );
        gl::GenerateMipmap(gl::TEXTURE_2D);

        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::REPEAT as _);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::REPEAT as _);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR_MIPMAP_LINEAR as _);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as _);

        gl::BindTexture(gl::TEXTURE_2D, 0);
    }

    Ok(id)
}
