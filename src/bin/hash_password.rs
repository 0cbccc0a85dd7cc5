use booking_admin_core::domain::services::tenant_directory::hash_password;

/// Prints an argon2 hash for a tenant's `credential.password_hash` entry.
fn main() {
    let Some(password) = std::env::args().nth(1) else {
        eprintln!("usage: hash-password <password>");
        std::process::exit(2);
    };

    match hash_password(&password) {
        Ok(hash) => println!("{}", hash),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
