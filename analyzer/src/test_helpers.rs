use cminus_dsl::{ast::Program, core::FileId};
use cminus_parser::parse_program;
use cminus_test::read_shared_resource;

#[ctor::ctor]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn parse_shared_program(name: &'static str) -> Program {
    let source = read_shared_resource(name);
    parse_program(&source, &FileId::from_string(name)).unwrap()
}
