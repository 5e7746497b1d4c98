use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use campus_incident::auth::JwtUtils;
use campus_incident::configuration::Settings;
use campus_incident::db::init_storage;
use campus_incident::startup::configure;
use campus_incident::telemetry::{get_subscriber, init_subscriber};
use dotenv::dotenv;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = get_subscriber(
        "campus_incident".into(),
        "info".into(),
        std::io::stdout,
    );
    init_subscriber(subscriber)?;

    info!("애플리케이션 시작 중...");

    let settings = Settings::from_env()?;
    info!("환경 변수 로드 완료");

    let storage = init_storage(&settings).await?;

    let storage_data = Data::new(storage);
    let jwt_data = Data::new(JwtUtils::new(&settings.jwt_secret, settings.session_ttl()));
    let settings_data = Data::new(settings.clone());

    info!("서버 시작 중: http://{}:{}", settings.host, settings.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(storage_data.clone())
            .app_data(jwt_data.clone())
            .app_data(settings_data.clone())
            .configure(configure)
    })
        .bind((settings.host.as_str(), settings.port))?
        .run()
        .await?;

    Ok(())
}
