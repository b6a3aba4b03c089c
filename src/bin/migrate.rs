use barbershop_booking_infra::run_migration;

#[actix_web::main]
async fn main() {
    run_migration()
        .await
        .expect("Failed to run the database migrations");
}
