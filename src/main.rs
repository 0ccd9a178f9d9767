use std::process::ExitCode;

fn main() -> ExitCode {
    match kaggle_sync::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[ERROR] {err}");
            let code = u8::try_from(err.exit_code()).unwrap_or(1);
            ExitCode::from(code.max(1))
        }
    }
}
