//! 結果列的 CSV 序列化

use rust_decimal::Decimal;

use order_core::{BuildLine, OrderError, OrderLine, Result};

/// 小數固定三位
fn format_quantity(value: Decimal) -> String {
    format!("{value:.3}")
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| OrderError::Data(format!("CSV 寫出失敗: {e}")))?;
    String::from_utf8(bytes).map_err(|e| OrderError::Data(format!("CSV 編碼錯誤: {e}")))
}

/// 採購建議清單的 CSV（UTF-8、逗號分隔、LF 換行）
pub fn order_lines_csv(lines: &[OrderLine]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "part_id",
            "name",
            "required",
            "available",
            "on_order",
            "to_order",
            "root_id",
            "root_name",
        ])
        .map_err(|e| OrderError::Data(format!("CSV 寫出失敗: {e}")))?;

    for line in lines {
        writer
            .write_record([
                line.part_id.to_string(),
                line.name.clone(),
                format_quantity(line.required),
                format_quantity(line.available),
                format_quantity(line.on_order),
                format_quantity(line.to_order),
                line.root_id.to_string(),
                line.root_name.clone(),
            ])
            .map_err(|e| OrderError::Data(format!("CSV 寫出失敗: {e}")))?;
    }
    finish(writer)
}

/// 生產建議清單的 CSV（UTF-8、逗號分隔、LF 換行）
pub fn build_lines_csv(lines: &[BuildLine]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "part_id",
            "name",
            "total_needed",
            "in_stock",
            "in_progress",
            "available",
            "to_build",
        ])
        .map_err(|e| OrderError::Data(format!("CSV 寫出失敗: {e}")))?;

    for line in lines {
        writer
            .write_record([
                line.part_id.to_string(),
                line.name.clone(),
                format_quantity(line.total_needed),
                format_quantity(line.in_stock),
                format_quantity(line.in_progress),
                format_quantity(line.available),
                format_quantity(line.to_build),
            ])
            .map_err(|e| OrderError::Data(format!("CSV 寫出失敗: {e}")))?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_core::PartId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_lines_csv_format() {
        let lines = vec![OrderLine {
            part_id: PartId(200),
            name: "Blech, verzinkt".to_string(),
            required: dec!(6),
            available: dec!(5),
            on_order: dec!(0),
            to_order: dec!(1),
            root_id: PartId(100),
            root_name: "Gerät".to_string(),
        }];

        let csv = order_lines_csv(&lines).unwrap();
        assert_eq!(
            csv,
            "part_id,name,required,available,on_order,to_order,root_id,root_name\n\
             200,\"Blech, verzinkt\",6.000,5.000,0.000,1.000,100,Gerät\n"
        );
    }

    #[test]
    fn test_build_lines_csv_format() {
        let lines = vec![BuildLine {
            part_id: PartId(110),
            name: "Modul".to_string(),
            total_needed: dec!(15),
            in_stock: dec!(10),
            in_progress: dec!(0),
            available: dec!(10),
            to_build: dec!(5),
        }];

        let csv = build_lines_csv(&lines).unwrap();
        assert_eq!(
            csv,
            "part_id,name,total_needed,in_stock,in_progress,available,to_build\n\
             110,Modul,15.000,10.000,0.000,10.000,5.000\n"
        );
    }

    #[test]
    fn test_empty_lists_emit_header_only() {
        assert_eq!(
            order_lines_csv(&[]).unwrap(),
            "part_id,name,required,available,on_order,to_order,root_id,root_name\n"
        );
        assert_eq!(
            build_lines_csv(&[]).unwrap(),
            "part_id,name,total_needed,in_stock,in_progress,available,to_build\n"
        );
    }
}
