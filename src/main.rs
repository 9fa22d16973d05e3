use tokio::runtime::Builder;

use quizdesk::web::server::start_app;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let runtime = match Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("quizdesk")
        .thread_stack_size(3 * 1024 * 1024)
        .enable_io()
        .enable_time()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            log::error!("Building runtime failed: {}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(start_app());
}
