// peernode supervises processes through /proc and POSIX signals; Linux-only.
fn main() {
    if !std::env::var("CARGO_CFG_TARGET_OS").map_or(false, |v| v == "linux") {
        eprintln!("error: peernode is Linux-only. Build on Linux or in a Linux container.");
        std::process::exit(1);
    }
}
