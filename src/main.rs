use warden::utils::errors::WardenError;

fn main() -> Result<(), WardenError> {
    tokio::runtime::Builder::new_multi_thread()
        // Cap the number of blocking threads - password hashing is pushed onto the blocking
        // pool and a burst of logins could otherwise spawn threads without bound.
        .max_blocking_threads(num_cpus::get())
        .enable_all()
        .build()
        .unwrap()
        .block_on(async {
            warden::lib_main().await
        })
}
