const PROTOS: &[&str] = &[
    "proto/admin.proto",
    "proto/event.proto",
    "proto/exec.proto",
    "proto/hwid.proto",
    "proto/locale.proto",
    "proto/notify.proto",
    "proto/socket.proto",
    "proto/systemd.proto",
    "proto/wifi.proto",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for proto in PROTOS {
        println!("cargo:rerun-if-changed={proto}");
    }

    // Use the vendored protoc unless the environment provides one
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    tonic_build::configure().build_server(true).build_client(true).compile_protos(PROTOS, &["proto"])?;
    Ok(())
}
