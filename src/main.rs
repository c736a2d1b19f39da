fn main() {
    if let Err(err) = topology_router::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
