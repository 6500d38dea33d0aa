use anyhow::Result;
use shared::models::AssessmentRecord;

use super::{AppContext, titled};

pub async fn list(ctx: &AppContext) -> Result<()> {
    let records = ctx
        .api()?
        .assessments()
        .await
        .map_err(titled("Error"))?;

    if records.is_empty() {
        println!("No assessments found");
        return Ok(());
    }

    println!("Previous Assessments");
    for record in &records {
        print!("{}", render_record(record));
    }
    Ok(())
}

fn render_record(record: &AssessmentRecord) -> String {
    format!(
        "\n{}\n  Age: {}\n  Age group: {}\n  Result: {}\n",
        record.created_at_display(),
        record.age_display(),
        record.age_group,
        record.outcome().summary()
    )
}
