//! Recording stand-in for a GL context.
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use super::{GlDriver, ProgramBinary};
use crate::types::Stage;
use crate::uniform::UniformValue;

/// Binary format tag the fake driver produces and accepts.
pub(crate) const MOCK_BINARY_FORMAT: u32 = 0x4d4f_434b;

#[derive(Debug, Default)]
struct MockState {
    next_id: u32,
    programs: BTreeMap<u32, bool>,
    shaders: BTreeMap<u32, Stage>,
    bound: Option<u32>,
    fail_link: Option<String>,
    fail_compile: Option<(Stage, String)>,
    calls: Vec<String>,
    uploads: Vec<(String, String)>,
}

#[derive(Debug)]
pub(crate) struct MockDriver {
    vendor: String,
    binary_formats: i32,
    uniforms: BTreeSet<String>,
    state: RefCell<MockState>,
}

impl MockDriver {
    pub(crate) fn new(vendor: &str) -> Self {
        Self {
            vendor: vendor.to_string(),
            binary_formats: 1,
            uniforms: BTreeSet::new(),
            state: RefCell::new(MockState::default()),
        }
    }

    pub(crate) fn with_binary_formats(mut self, count: i32) -> Self {
        self.binary_formats = count;
        self
    }

    /// Names `uniform_location` resolves; everything else is unknown.
    pub(crate) fn with_uniforms(mut self, names: &[&str]) -> Self {
        self.uniforms = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub(crate) fn fail_link(&self, log: &str) {
        self.state.borrow_mut().fail_link = Some(log.to_string());
    }

    pub(crate) fn fail_compile(&self, stage: Stage, log: &str) {
        self.state.borrow_mut().fail_compile = Some((stage, log.to_string()));
    }

    pub(crate) fn is_linked(&self, program: u32) -> bool {
        self.state.borrow().programs.get(&program) == Some(&true)
    }

    pub(crate) fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub(crate) fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub(crate) fn bound_program(&self) -> Option<u32> {
        self.state.borrow().bound
    }

    pub(crate) fn count_calls(&self, prefix: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Position of the first call starting with `prefix`.
    pub(crate) fn call_index(&self, prefix: &str) -> Option<usize> {
        self.state
            .borrow()
            .calls
            .iter()
            .position(|call| call.starts_with(prefix))
    }

    /// Uniform uploads as `(name, value)` in call order.
    pub(crate) fn uploads(&self) -> Vec<(String, String)> {
        self.state.borrow().uploads.clone()
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn allocate(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.next_id
    }
}

impl GlDriver for MockDriver {
    type Program = u32;
    type Shader = u32;
    type UniformLocation = String;

    fn vendor(&self) -> String {
        self.vendor.clone()
    }

    fn create_program(&self) -> Result<u32, String> {
        let id = self.allocate();
        self.state.borrow_mut().programs.insert(id, false);
        self.record(format!("create_program {id}"));
        Ok(id)
    }

    fn delete_program(&self, program: u32) {
        self.state.borrow_mut().programs.remove(&program);
        self.record(format!("delete_program {program}"));
    }

    fn create_shader(&self, stage: Stage) -> Result<u32, String> {
        let id = self.allocate();
        self.state.borrow_mut().shaders.insert(id, stage);
        self.record(format!("create_shader {stage}"));
        Ok(id)
    }

    fn delete_shader(&self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
        self.record(format!("delete_shader {shader}"));
    }

    fn shader_binary(&self, shader: u32, spirv: &[u32]) {
        self.record(format!("shader_binary {shader} {}", spirv.len()));
    }

    fn specialize_shader(&self, _shader: u32, entry_point: &str) {
        self.record(format!("specialize_shader {entry_point}"));
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.record(format!("shader_source {shader} {}", source.len()));
    }

    fn compile_shader(&self, shader: u32) {
        self.record(format!("compile_shader {shader}"));
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        let state = self.state.borrow();
        match (&state.fail_compile, state.shaders.get(&shader)) {
            (Some((failing, _)), Some(stage)) => failing != stage,
            _ => true,
        }
    }

    fn shader_info_log(&self, _shader: u32) -> String {
        self.state
            .borrow()
            .fail_compile
            .as_ref()
            .map(|(_, log)| log.clone())
            .unwrap_or_default()
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(format!("attach_shader {program} {shader}"));
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        self.record(format!("detach_shader {program} {shader}"));
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        let linked = state.fail_link.is_none();
        if let Some(status) = state.programs.get_mut(&program) {
            *status = linked;
        }
        drop(state);
        self.record(format!("link_program {program}"));
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.is_linked(program)
    }

    fn program_info_log(&self, _program: u32) -> String {
        self.state.borrow().fail_link.clone().unwrap_or_default()
    }

    fn program_binary_format_count(&self) -> i32 {
        self.binary_formats
    }

    fn request_retrievable_binary(&self, program: u32) {
        self.record(format!("request_retrievable_binary {program}"));
    }

    fn program_binary(&self, program: u32) -> Option<ProgramBinary> {
        self.is_linked(program).then(|| ProgramBinary {
            format: MOCK_BINARY_FORMAT,
            bytes: format!("mock-program-{program}").into_bytes(),
        })
    }

    fn load_program_binary(&self, program: u32, binary: &ProgramBinary) {
        let accepted = binary.format == MOCK_BINARY_FORMAT;
        if let Some(status) = self.state.borrow_mut().programs.get_mut(&program) {
            *status = accepted;
        }
        self.record(format!("load_program_binary {program} {}", binary.bytes.len()));
    }

    fn use_program(&self, program: Option<u32>) {
        self.state.borrow_mut().bound = program;
        self.record(format!("use_program {program:?}"));
    }

    fn uniform_location(&self, _program: u32, name: &str) -> Option<String> {
        self.uniforms.contains(name).then(|| name.to_string())
    }

    fn upload_uniform(&self, location: &String, value: UniformValue<'_>) {
        self.state
            .borrow_mut()
            .uploads
            .push((location.clone(), format!("{value:?}")));
    }
}
