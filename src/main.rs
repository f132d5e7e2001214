use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    l4m::cli::main()
}
