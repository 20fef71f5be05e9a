//! Compiles the pulumirpc protocol files into `OUT_DIR/pulumirpc.rs`.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &["proto/pulumi/provider.proto", "proto/pulumi/engine.proto"],
            &["proto"],
        )?;

    println!("cargo:rerun-if-changed=proto/pulumi");

    Ok(())
}
