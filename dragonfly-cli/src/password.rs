//! Terminal password prompting, wired into the core through
//! `PasswordSource`. Encryption re-prompts for confirmation, matching
//! the upstream "two password buffers... to ensure the intended
//! password is used without error" discipline.

use zeroize::Zeroize;

use dragonfly_crypto::io::PasswordSource;

pub struct TerminalPassword;

impl PasswordSource for TerminalPassword {
    fn obtain(&mut self) -> Vec<u8> {
        rpassword::prompt_password("Password: ")
            .expect("failed to read password from terminal")
            .into_bytes()
    }

    fn obtain_with_confirmation(&mut self) -> Option<Vec<u8>> {
        let mut first = rpassword::prompt_password("Password: ").expect("failed to read password from terminal");
        let mut second = rpassword::prompt_password("Reenter password: ").expect("failed to read password from terminal");
        let result = if first == second { Some(first.clone().into_bytes()) } else { None };
        first.zeroize();
        second.zeroize();
        result
    }
}
