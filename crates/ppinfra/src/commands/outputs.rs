use crate::utils::LoadedStack;
use colored::Colorize;
use ppinfra_cloud::ProvisioningEngine;
use ppinfra_core::StackOutputs;

pub async fn handle(
    loaded: &LoadedStack,
    engine: &dyn ProvisioningEngine,
    json: bool,
) -> anyhow::Result<()> {
    let attributes = engine.attributes().await?;
    let outputs = StackOutputs::project(&loaded.resolved.graph, &attributes);

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    println!("スタック: {}", loaded.stack_name.cyan());
    print_outputs(&outputs);
    Ok(())
}

pub fn print_outputs(outputs: &StackOutputs) {
    println!("{}", "出力:".bold());
    for (name, value) in outputs.entries() {
        match value {
            Some(v) => println!("  {:<15} {}", name, v.cyan()),
            None => println!("  {:<15} {}", name, "(未作成)".dimmed()),
        }
    }
}
