fn main() -> Result<(), Box<dyn std::error::Error>> {
    codecorrect::cli::main()
}
