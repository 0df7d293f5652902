fn main() -> std::process::ExitCode {
    sait_lib::run()
}
