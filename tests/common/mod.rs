use calamine::{Data, Range};
use tofx::testlib::sheet::{build_sheet, e, s};

pub fn trade_header_row() -> Vec<Data> {
    vec![
        s("Номер\nсделки"),
        s("Номер\nпоручения"),
        s("Дата\nзаключения"),
        s("Время"),
        s("Вид\nсделки"),
        s("Сокращенное\nнаименование\nактива"),
        s("Код\nактива"),
        s("Цена\nза единицу"),
        s("Валюта\nцены"),
        s("Количество"),
        s("Сумма\n(без НКД)"),
        s("НКД"),
        s("Сумма\nсделки"),
        s("Валюта\nрасчетов"),
        s("Комиссия\nброкера"),
    ]
}

pub fn cashflow_header_row() -> Vec<Data> {
    vec![
        s("Дата\nисполнения"),
        s("Операция"),
        s("Сумма\nзачисления"),
        s("Сумма\nсписания"),
        s("Примечание"),
    ]
}

#[allow(clippy::too_many_arguments)]
pub fn trade_row(
    deal_num: &str,
    order_num: &str,
    label: &str,
    asset_name: &str,
    asset_code: &str,
    price: &str,
    qty: &str,
    amount: &str,
    currency: &str,
    fee: &str,
) -> Vec<Data> {
    vec![
        s(deal_num),
        s(order_num),
        s("13.01.2021"),
        s("12:01:10"),
        s(label),
        s(asset_name),
        s(asset_code),
        s(price),
        s(currency),
        s(qty),
        s(amount),
        e(),
        s(amount),
        s(currency),
        s(fee),
    ]
}

pub fn cashflow_row(
    date: &str,
    label: &str,
    credit: &str,
    debit: &str,
    note: &str,
) -> Vec<Data> {
    vec![s(date), s(label), s(credit), s(debit), s(note)]
}

/// A report resembling the broker's export: preamble, paginated trade
/// section (with a mid-page header repeat, a page-footer artifact, and the
/// unfulfilled-trades sub-table at shifted column offsets), the
/// multi-currency cash-flow section, and the securities master.
pub fn sample_report() -> Range<Data> {
    let mut footer = vec![Data::Empty; 53];
    footer[52] = s("2 из 8");

    let mut midpage_header = vec![s("Номер сделки")];
    midpage_header.extend(trade_header_row().into_iter().skip(1));

    let mut shifted_header = trade_header_row();
    shifted_header.insert(0, e());
    let mut shifted_trade = trade_row(
        "4000000001",
        "900105",
        "Продажа",
        "Тинькофф iMOEX",
        "TMOS",
        "5,5",
        "10",
        "55",
        "RUB",
        "0,10",
    );
    shifted_trade.insert(0, e());

    build_sheet(vec![
        vec![s("Отчет о сделках и операциях за период")],
        vec![s("1.1 Информация о совершенных и исполненных сделках на конец отчетного периода")],
        trade_header_row(),
        trade_row(
            "1265994929", "900100", "Продажа", "М.видео", "MVID", "854",
            "14", "11956", "RUB", "5,98",
        ),
        trade_row(
            "2000000001", "900101", "Покупка", "Apple", "AAPL", "120", "10",
            "1200", "USD", "1,50",
        ),
        footer,
        midpage_header,
        trade_row(
            "2000000002", "900102", "Покупка", "Сбербанк", "SBER", "270",
            "20", "5400", "RUB", "2,70",
        ),
        trade_row(
            "3000000001", "900103", "Покупка", "USDRUB_TOM", "USDRUB",
            "76,09", "300", "22827", "RUB", "10",
        ),
        trade_row(
            "3000000002", "900104", "Продажа", "EURRUB_TOM", "EURRUB",
            "90,5", "100", "9050", "RUB", "0,00",
        ),
        trade_row(
            "5000000001", "900106", "РЕПО 1 Покупка", "Сбербанк", "SBER",
            "270", "20", "5400", "RUB", "0,00",
        ),
        trade_row(
            "5000000002", "900107", "Экспирация", "Сбербанк", "SBER", "270",
            "20", "5400", "RUB", "0,00",
        ),
        vec![s("1.2 Информация о неисполненных сделках на конец отчетного периода")],
        shifted_header,
        shifted_trade,
        vec![s("1.3 Сделки за расчетный период, обязательства из которых прекращены не в результате исполнения")],
        vec![s("2. Операции с денежными средствами")],
        vec![
            s("Валюта"),
            s("Входящий остаток"),
            s("Зачислено"),
            s("Списано"),
            s("Исходящий остаток"),
        ],
        vec![s("RUB"), s("1000"), s("2000"), s("1500"), s("1500")],
        vec![s("USD"), s("10"), s("20"), s("15"), s("15")],
        vec![s("RUB")],
        cashflow_header_row(),
        cashflow_row("15.01.2021", "Пополнение счета", "7000", "0", ""),
        cashflow_row(
            "18.01.2021",
            "Выплата дивидендов",
            "150,25",
            "0",
            "Walmart-ао/ 3 шт.",
        ),
        cashflow_row(
            "19.01.2021",
            "Выплата дивидендов",
            "0",
            "0",
            "План;Walmart-ао/ 3 шт.",
        ),
        cashflow_row(
            "20.01.2021",
            "Выплата дивидендов",
            "10",
            "0",
            "Неизвестная бумага/ 5 шт.",
        ),
        cashflow_row("20.01.2021", "Выплата дивидендов", "10", "0", "хвост"),
        cashflow_row("21.01.2021", "Налог (дивиденды)", "0", "13,5", ""),
        cashflow_row("22.01.2021", "Комиссия по тарифу", "0", "99", ""),
        cashflow_row("23.01.2021", "Покупка/продажа", "0", "11956", ""),
        cashflow_row("24.01.2021", "Доп. операция", "0", "5", ""),
        vec![s("USD")],
        cashflow_header_row(),
        cashflow_row("25.01.2021", "Вывод средств", "0", "500", ""),
        vec![s("3.1 Движение по ценным бумагам инвестора")],
        vec![s("4.1 Информация о ценных бумагах")],
        vec![s("Сокращенное наименование актива"), s("Код актива")],
        vec![s("М.видео"), s("MVID")],
        vec![s("Walmart-ао"), s("WMT")],
        vec![s("Сокращенное наименование актива"), s("Код актива")],
        vec![s("Тинькофф iMOEX"), s("TMOS")],
        vec![s("4.2 Информация об инструментах, не квалифицированных в качестве ценной бумаги")],
    ])
}
