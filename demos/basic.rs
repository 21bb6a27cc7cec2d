use eco_client::{ClientBuilder, ClusterOpt, PoolOpt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = ClientBuilder::from_env()?.user_agent("eco-demo/0.1").build()?;

    println!("server version: {}", client.clusters().server_version().await?);

    for cluster in client.clusters().list().await? {
        println!("{:>6}  {:<24} {}", cluster.id, cluster.name, cluster.status);
    }

    let opt = ClusterOpt {
        name: "demo".to_owned(),
        version: "v1.29.4".to_owned(),
        master_opt: PoolOpt {
            node_count: 1,
            flavor: "g1-standard-2-4".to_owned(),
            ..PoolOpt::default()
        },
        ..ClusterOpt::default()
    };
    let id = client.clusters().create(&opt).await?;
    println!("created cluster {id}");

    let admin = client.users().admin_config(id, "1h").await?;
    println!("{}", admin.content);

    client.clusters().delete(id).await?;
    Ok(())
}
