#[tokio::main]
async fn main() {
    if let Err(e) = booking_admin_core::run().await {
        eprintln!("booking-admin-core failed: {}", e);
        std::process::exit(1);
    }
}
