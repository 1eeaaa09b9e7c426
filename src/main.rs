fn main() {
    std::process::exit(hermit::run());
}
