mod command;
mod export;
mod schema;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
