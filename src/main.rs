pub mod cli;
pub mod emit;
pub mod merge;
pub mod model;
pub mod path_de;
pub mod pattern;
pub mod tokenize;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
