//! [`GlDriver`] on the global `gl` function table.
//!
//! `gl` exposes the 4.6 core entry points, including `glShaderBinary` and
//! `glSpecializeShader` needed for the SPIR-V link path.
use std::ffi::{c_void, CStr, CString};
use std::marker::PhantomData;
use std::ptr;

use gl::types::{GLchar, GLenum, GLint, GLsizei, GLuint};
use tracing::debug;

use super::{GlDriver, ProgramBinary};
use crate::types::Stage;
use crate::uniform::UniformValue;

/// Handle to the OpenGL context current on the creating thread.
///
/// Not `Send`: GL calls must stay on the thread that owns the context.
#[derive(Debug)]
pub struct GlContext {
    _thread_bound: PhantomData<*const ()>,
}

impl GlContext {
    /// Loads every GL entry point through `loader` (for example
    /// `glutin`'s `get_proc_address`).
    ///
    /// # Safety
    ///
    /// An OpenGL 4.5+ context must be current on this thread for as long as
    /// the returned value is used.
    pub unsafe fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        debug!(
            spirv = gl::ShaderBinary::is_loaded() && gl::SpecializeShader::is_loaded(),
            program_binary = gl::ProgramBinary::is_loaded(),
            "loaded GL entry points"
        );
        Self {
            _thread_bound: PhantomData,
        }
    }
}

impl GlDriver for GlContext {
    type Program = GLuint;
    type Shader = GLuint;
    type UniformLocation = GLint;

    fn vendor(&self) -> String {
        let vendor = unsafe { gl::GetString(gl::VENDOR) };
        if vendor.is_null() {
            return String::new();
        }
        unsafe { CStr::from_ptr(vendor.cast()) }
            .to_string_lossy()
            .into_owned()
    }

    fn create_program(&self) -> Result<GLuint, String> {
        match unsafe { gl::CreateProgram() } {
            0 => Err("glCreateProgram returned 0".to_string()),
            program => Ok(program),
        }
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn create_shader(&self, stage: Stage) -> Result<GLuint, String> {
        match unsafe { gl::CreateShader(shader_kind(stage)) } {
            0 => Err(format!("glCreateShader returned 0 for the {stage} stage")),
            shader => Ok(shader),
        }
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn shader_binary(&self, shader: GLuint, spirv: &[u32]) {
        let bytes: &[u8] = bytemuck::cast_slice(spirv);
        unsafe {
            gl::ShaderBinary(
                1,
                &shader,
                gl::SHADER_BINARY_FORMAT_SPIR_V,
                bytes.as_ptr().cast(),
                gl_len(bytes.len()),
            )
        }
    }

    fn specialize_shader(&self, shader: GLuint, entry_point: &str) {
        let Ok(entry_point) = CString::new(entry_point) else {
            debug!(entry_point, "entry point contains a NUL byte; not specializing");
            return;
        };
        unsafe {
            gl::SpecializeShader(shader, entry_point.as_ptr(), 0, ptr::null(), ptr::null())
        }
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        let source_ptr = source.as_ptr().cast::<GLchar>();
        let length = gl_len(source.len());
        unsafe { gl::ShaderSource(shader, 1, &source_ptr, &length) }
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) }
    }

    fn shader_compile_status(&self, shader: GLuint) -> bool {
        let mut status = 0;
        unsafe { gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status) };
        status == gl::TRUE as GLint
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let mut length = 0;
        unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut length) };
        read_log(length, |capacity, written, buffer| unsafe {
            gl::GetShaderInfoLog(shader, capacity, written, buffer)
        })
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::DetachShader(program, shader) }
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) }
    }

    fn program_link_status(&self, program: GLuint) -> bool {
        let mut status = 0;
        unsafe { gl::GetProgramiv(program, gl::LINK_STATUS, &mut status) };
        status == gl::TRUE as GLint
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let mut length = 0;
        unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut length) };
        read_log(length, |capacity, written, buffer| unsafe {
            gl::GetProgramInfoLog(program, capacity, written, buffer)
        })
    }

    fn program_binary_format_count(&self) -> i32 {
        let mut count = 0;
        unsafe { gl::GetIntegerv(gl::NUM_PROGRAM_BINARY_FORMATS, &mut count) };
        count
    }

    fn request_retrievable_binary(&self, program: GLuint) {
        unsafe {
            gl::ProgramParameteri(
                program,
                gl::PROGRAM_BINARY_RETRIEVABLE_HINT,
                gl::TRUE as GLint,
            )
        }
    }

    fn program_binary(&self, program: GLuint) -> Option<ProgramBinary> {
        let mut length = 0;
        unsafe { gl::GetProgramiv(program, gl::PROGRAM_BINARY_LENGTH, &mut length) };
        if length <= 0 {
            return None;
        }
        let mut bytes = vec![0u8; length as usize];
        let mut written: GLsizei = 0;
        let mut format: GLenum = 0;
        unsafe {
            gl::GetProgramBinary(
                program,
                length,
                &mut written,
                &mut format,
                bytes.as_mut_ptr().cast(),
            )
        };
        bytes.truncate(usize::try_from(written).unwrap_or(0));
        (!bytes.is_empty()).then_some(ProgramBinary { format, bytes })
    }

    fn load_program_binary(&self, program: GLuint, binary: &ProgramBinary) {
        unsafe {
            gl::ProgramBinary(
                program,
                binary.format,
                binary.bytes.as_ptr().cast(),
                gl_len(binary.bytes.len()),
            )
        }
    }

    fn use_program(&self, program: Option<GLuint>) {
        unsafe { gl::UseProgram(program.unwrap_or(0)) }
    }

    fn uniform_location(&self, program: GLuint, name: &str) -> Option<GLint> {
        let name = CString::new(name).ok()?;
        match unsafe { gl::GetUniformLocation(program, name.as_ptr()) } {
            -1 => None,
            location => Some(location),
        }
    }

    fn upload_uniform(&self, location: &GLint, value: UniformValue<'_>) {
        let location = *location;
        unsafe {
            match value {
                UniformValue::Int(value) => gl::Uniform1i(location, value),
                UniformValue::IntArray(values) => {
                    gl::Uniform1iv(location, gl_len(values.len()), values.as_ptr())
                }
                UniformValue::Float(value) => gl::Uniform1f(location, value),
                UniformValue::Float2(value) => gl::Uniform2f(location, value.x, value.y),
                UniformValue::Float3(value) => gl::Uniform3f(location, value.x, value.y, value.z),
                UniformValue::Float4(value) => {
                    gl::Uniform4f(location, value.x, value.y, value.z, value.w)
                }
                UniformValue::Mat3(matrix) => gl::UniformMatrix3fv(
                    location,
                    1,
                    gl::FALSE,
                    matrix.to_cols_array().as_ptr(),
                ),
                UniformValue::Mat4(matrix) => gl::UniformMatrix4fv(
                    location,
                    1,
                    gl::FALSE,
                    matrix.to_cols_array().as_ptr(),
                ),
            }
        }
    }
}

fn shader_kind(stage: Stage) -> GLenum {
    match stage {
        Stage::Vertex => gl::VERTEX_SHADER,
        Stage::Fragment => gl::FRAGMENT_SHADER,
    }
}

/// Clamps a buffer length to `GLsizei`.
fn gl_len(len: usize) -> GLsizei {
    GLsizei::try_from(len).unwrap_or(GLsizei::MAX)
}

/// Reads an info log of `length` bytes (NUL included) through `fetch`.
fn read_log(length: GLint, fetch: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar)) -> String {
    let Ok(capacity) = usize::try_from(length) else {
        return String::new();
    };
    if capacity == 0 {
        return String::new();
    }
    let mut buffer = vec![0u8; capacity];
    let mut written: GLsizei = 0;
    fetch(length, &mut written, buffer.as_mut_ptr().cast());
    buffer.truncate(usize::try_from(written).unwrap_or(0).min(capacity));
    String::from_utf8_lossy(&buffer).trim_end().to_string()
}
