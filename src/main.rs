fn main() {
    if let Err(e) = screen_printer_lib::run() {
        eprintln!("screen-printer: {}", e);
        std::process::exit(1);
    }
}
