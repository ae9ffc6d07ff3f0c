//! Terminal front-end for the FreshMart storefront.
//!
//! Each invocation opens the local store, runs one command, prints the
//! resulting notice and exits. The signed-in session and the cart persist
//! between invocations.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use freshmart::config::StorefrontConfig;
use freshmart::error::StorefrontError;
use freshmart::models::{
    Cart, DeliveryDetails, Order, OrderId, OrderStatus, Product, ProductDraft, ProductId,
    ProductPatch,
};
use freshmart::storage::{FileStorage, Storage};
use freshmart::storefront::Storefront;
use owo_colors::OwoColorize;

/// FreshMart storefront CLI: shop, check out and run the admin dashboard.
#[derive(Debug, Parser)]
#[command(name = "freshmart", version, about)]
struct Cli {
    /// Override the storage directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account and sign in.
    Register {
        /// Username or email address.
        identifier: String,
        /// Account password.
        #[arg(long)]
        password: String,
        /// Admin PIN, when the store is configured with the `pin` policy.
        #[arg(long)]
        admin_pin: Option<String>,
    },
    /// Sign in to an existing account.
    Login {
        /// Username or email address.
        identifier: String,
        /// Account password.
        #[arg(long)]
        password: String,
    },
    /// Sign out and empty the cart.
    Logout,
    /// Show the signed-in account.
    Whoami,
    /// List the catalog.
    Products,
    /// Manage catalog products (admin).
    #[command(subcommand)]
    Product(ProductCommand),
    /// Replace the catalog with the demo products (admin).
    Seed,
    /// Work with the cart.
    #[command(subcommand)]
    Cart(CartCommand),
    /// Place an order for the cart.
    Checkout(DeliveryArgs),
    /// List orders visible to the signed-in account.
    Orders,
    /// Show one order visible to the signed-in account.
    Order {
        /// Order ID.
        id: OrderId,
    },
    /// Move an order to a new status (admin).
    Status {
        /// Order ID.
        order: OrderId,
        /// New status: pending, dispatched or delivered.
        #[arg(value_parser = parse_status)]
        status: OrderStatus,
    },
    /// Show revenue for a status (admin).
    Revenue {
        /// Status to total (default: delivered).
        #[arg(long, value_parser = parse_status)]
        status: Option<OrderStatus>,
    },
    /// Create another admin account (admin).
    AddAdmin {
        /// Username or email address.
        identifier: String,
        /// Account password.
        #[arg(long)]
        password: String,
    },
    /// Export products, orders and users as JSON (admin).
    Export {
        /// Write to this file instead of stdout.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Import products, orders and users from a JSON export (admin).
    Import {
        /// Exported JSON file.
        file: PathBuf,
    },
}

/// Catalog management subcommands.
#[derive(Debug, Subcommand)]
enum ProductCommand {
    /// Add a product.
    Add(ProductArgs),
    /// Change fields of a product.
    Update {
        /// Product ID.
        id: ProductId,
        /// Fields to replace.
        #[command(flatten)]
        fields: PatchArgs,
    },
    /// Delete a product.
    Remove {
        /// Product ID.
        id: ProductId,
    },
}

/// Cart subcommands.
#[derive(Debug, Subcommand)]
enum CartCommand {
    /// Add one unit of a product.
    Add {
        /// Product ID.
        id: ProductId,
    },
    /// Show the cart with totals.
    Show,
    /// Empty the cart.
    Clear,
}

/// Fields of a new product. Numbers are validated by the store.
#[derive(Debug, Args)]
struct ProductArgs {
    /// Display name.
    #[arg(long)]
    name: String,
    /// Unit price in whole currency units.
    #[arg(long)]
    price: String,
    /// Category label.
    #[arg(long)]
    category: String,
    /// Units in stock.
    #[arg(long)]
    stock: String,
    /// Optional icon.
    #[arg(long)]
    emoji: Option<String>,
    /// Optional brand.
    #[arg(long)]
    brand: Option<String>,
}

/// Replacement fields for `product update`.
#[derive(Debug, Args)]
struct PatchArgs {
    /// New display name.
    #[arg(long)]
    name: Option<String>,
    /// New unit price.
    #[arg(long)]
    price: Option<String>,
    /// New category label.
    #[arg(long)]
    category: Option<String>,
    /// New stock count.
    #[arg(long)]
    stock: Option<String>,
    /// New icon (empty clears it).
    #[arg(long)]
    emoji: Option<String>,
    /// New brand (empty clears it).
    #[arg(long)]
    brand: Option<String>,
}

/// Delivery details for `checkout`.
#[derive(Debug, Args)]
struct DeliveryArgs {
    /// Recipient name.
    #[arg(long)]
    name: String,
    /// Contact phone.
    #[arg(long)]
    phone: String,
    /// Street or area.
    #[arg(long)]
    location: String,
    /// Building or apartment name.
    #[arg(long)]
    building: String,
    /// Door or unit number.
    #[arg(long)]
    door: String,
}

impl From<ProductArgs> for ProductDraft {
    fn from(args: ProductArgs) -> Self {
        Self {
            name: args.name,
            price: args.price,
            category: args.category,
            stock: args.stock,
            emoji: args.emoji,
            brand: args.brand,
        }
    }
}

impl From<PatchArgs> for ProductPatch {
    fn from(args: PatchArgs) -> Self {
        Self {
            name: args.name,
            price: args.price,
            category: args.category,
            stock: args.stock,
            emoji: args.emoji,
            brand: args.brand,
        }
    }
}

impl From<DeliveryArgs> for DeliveryDetails {
    fn from(args: DeliveryArgs) -> Self {
        Self {
            recipient_name: args.name,
            phone: args.phone,
            location: args.location,
            building: args.building,
            door: args.door,
        }
    }
}

/// Parses an order status for clap (case-insensitive).
fn parse_status(s: &str) -> Result<OrderStatus, String> {
    s.parse()
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(err) => return report("invalid configuration", &err),
    };

    let storage = match create_storage(cli.data_dir) {
        Ok(storage) => storage,
        Err(err) => return report("failed to initialize storage", &err),
    };

    let mut shop = match Storefront::builder()
        .storage(storage)
        .config(config)
        .build()
    {
        Ok(shop) => shop,
        Err(err) => return report("failed to open store", &err),
    };

    let code = dispatch(&mut shop, cli.command)?;
    finish(&shop, code)
}

/// Writes every entity back before exit.
///
/// Keeps `code` unless the final save fails.
fn finish<S: Storage>(shop: &Storefront<S>, code: ExitCode) -> io::Result<ExitCode> {
    match shop.flush() {
        Ok(()) => Ok(code),
        Err(err) => report("failed to save store", &err),
    }
}

/// Creates the storage backend, using `data_dir` if provided or the
/// default XDG data directory otherwise.
fn create_storage(data_dir: Option<PathBuf>) -> freshmart::error::Result<FileStorage> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    FileStorage::new(dir)
}

/// Dispatches to the subcommand handler, then shows any active notice.
fn dispatch<S: Storage>(shop: &mut Storefront<S>, command: Command) -> io::Result<ExitCode> {
    let code = match command {
        Command::Register {
            identifier,
            password,
            admin_pin,
        } => cmd_register(shop, &identifier, &password, admin_pin.as_deref()),
        Command::Login {
            identifier,
            password,
        } => cmd_login(shop, &identifier, &password),
        Command::Logout => cmd_logout(shop),
        Command::Whoami => cmd_whoami(shop),
        Command::Products => print_products_table(shop.products()).map(|()| ExitCode::SUCCESS),
        Command::Product(sub) => cmd_product(shop, sub),
        Command::Seed => cmd_seed(shop),
        Command::Cart(sub) => cmd_cart(shop, sub),
        Command::Checkout(args) => cmd_checkout(shop, args.into()),
        Command::Orders => cmd_orders(shop),
        Command::Order { id } => cmd_order(shop, id),
        Command::Status { order, status } => cmd_status(shop, order, status),
        Command::Revenue { status } => cmd_revenue(shop, status),
        Command::AddAdmin {
            identifier,
            password,
        } => cmd_add_admin(shop, &identifier, &password),
        Command::Export { output } => cmd_export(shop, output),
        Command::Import { file } => cmd_import(shop, &file),
    }?;
    print_notice(shop)?;
    Ok(code)
}

/// Prints a failed command to stderr and returns a failure exit code.
fn report(context: &str, err: &StorefrontError) -> io::Result<ExitCode> {
    writeln!(
        io::stderr().lock(),
        "{} {context}: {err}",
        "error:".red().bold()
    )?;
    Ok(ExitCode::FAILURE)
}

/// Executes the `register` subcommand.
fn cmd_register<S: Storage>(
    shop: &mut Storefront<S>,
    identifier: &str,
    password: &str,
    admin_pin: Option<&str>,
) -> io::Result<ExitCode> {
    match shop.register(identifier, password, admin_pin) {
        Ok(user) => {
            writeln!(
                io::stdout().lock(),
                "Registered {} as {}",
                user.identifier.bold(),
                user.role.green()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("registration failed", &err),
    }
}

/// Executes the `login` subcommand.
fn cmd_login<S: Storage>(
    shop: &mut Storefront<S>,
    identifier: &str,
    password: &str,
) -> io::Result<ExitCode> {
    match shop.login(identifier, password) {
        Ok(user) => {
            writeln!(
                io::stdout().lock(),
                "Signed in as {} ({})",
                user.identifier.bold(),
                user.role
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("login failed", &err),
    }
}

/// Executes the `logout` subcommand.
fn cmd_logout<S: Storage>(shop: &mut Storefront<S>) -> io::Result<ExitCode> {
    match shop.logout() {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => report("logout failed", &err),
    }
}

/// Executes the `whoami` subcommand.
fn cmd_whoami<S: Storage>(shop: &Storefront<S>) -> io::Result<ExitCode> {
    let mut out = io::stdout().lock();
    match shop.current_user() {
        Some(user) => writeln!(
            out,
            "{} ({}), {} item(s) in cart",
            user.identifier.bold(),
            user.role,
            shop.cart().item_count()
        )?,
        None => writeln!(out, "{}", "Not signed in.".dimmed())?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes a `product` subcommand.
fn cmd_product<S: Storage>(shop: &mut Storefront<S>, command: ProductCommand) -> io::Result<ExitCode> {
    let (verb, result) = match command {
        ProductCommand::Add(args) => ("added", shop.add_product(args.into())),
        ProductCommand::Update { id, fields } => {
            ("updated", shop.update_product(id, &fields.into()))
        }
        ProductCommand::Remove { id } => ("removed", shop.remove_product(id)),
    };
    match result {
        Ok(product) => {
            writeln!(
                io::stdout().lock(),
                "Product {} {verb} (id {})",
                product.name.bold(),
                product.id
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("product change failed", &err),
    }
}

/// Executes the `seed` subcommand.
fn cmd_seed<S: Storage>(shop: &mut Storefront<S>) -> io::Result<ExitCode> {
    match shop.seed_catalog() {
        Ok(_count) => print_products_table(shop.products()).map(|()| ExitCode::SUCCESS),
        Err(err) => report("seeding failed", &err),
    }
}

/// Executes a `cart` subcommand.
fn cmd_cart<S: Storage>(shop: &mut Storefront<S>, command: CartCommand) -> io::Result<ExitCode> {
    match command {
        CartCommand::Add { id } => match shop.add_to_cart(id) {
            Ok(line) => {
                writeln!(
                    io::stdout().lock(),
                    "{} x{} in cart",
                    line.product.name.bold(),
                    line.quantity
                )?;
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => report("could not add to cart", &err),
        },
        CartCommand::Show => {
            print_cart(shop.cart(), shop.config().delivery_fee_amount())?;
            Ok(ExitCode::SUCCESS)
        }
        CartCommand::Clear => match shop.clear_cart() {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(err) => report("could not clear cart", &err),
        },
    }
}

/// Executes the `checkout` subcommand.
fn cmd_checkout<S: Storage>(
    shop: &mut Storefront<S>,
    delivery: DeliveryDetails,
) -> io::Result<ExitCode> {
    match shop.checkout(&delivery) {
        Ok(order) => {
            print_orders_table(&[&order])?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("checkout failed", &err),
    }
}

/// Executes the `orders` subcommand.
fn cmd_orders<S: Storage>(shop: &Storefront<S>) -> io::Result<ExitCode> {
    if shop.current_user().is_none() {
        return report("cannot list orders", &StorefrontError::login_required());
    }
    print_orders_table(&shop.visible_orders())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `order` subcommand.
fn cmd_order<S: Storage>(shop: &Storefront<S>, id: OrderId) -> io::Result<ExitCode> {
    if shop.current_user().is_none() {
        return report("cannot show order", &StorefrontError::login_required());
    }
    match shop.order(id) {
        Some(order) => {
            print_orders_table(&[order])?;
            Ok(ExitCode::SUCCESS)
        }
        None => report(
            "cannot show order",
            &StorefrontError::not_found("order", id),
        ),
    }
}

/// Executes the `status` subcommand.
fn cmd_status<S: Storage>(
    shop: &mut Storefront<S>,
    id: OrderId,
    status: OrderStatus,
) -> io::Result<ExitCode> {
    match shop.set_order_status(id, status) {
        Ok(_order) => Ok(ExitCode::SUCCESS),
        Err(err) => report("status change failed", &err),
    }
}

/// Executes the `revenue` subcommand.
fn cmd_revenue<S: Storage>(
    shop: &Storefront<S>,
    status: Option<OrderStatus>,
) -> io::Result<ExitCode> {
    let (status, result) = match status {
        Some(status) => (status, shop.revenue(status)),
        None => (OrderStatus::Delivered, shop.delivered_revenue()),
    };
    match result {
        Ok(total) => {
            writeln!(
                io::stdout().lock(),
                "{} {}",
                format_args!("{status} revenue:").bold(),
                format_money(total).green()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("cannot read revenue", &err),
    }
}

/// Executes the `add-admin` subcommand.
fn cmd_add_admin<S: Storage>(
    shop: &mut Storefront<S>,
    identifier: &str,
    password: &str,
) -> io::Result<ExitCode> {
    match shop.add_admin(identifier, password) {
        Ok(_user) => Ok(ExitCode::SUCCESS),
        Err(err) => report("could not add admin", &err),
    }
}

/// Executes the `export` subcommand.
fn cmd_export<S: Storage>(shop: &Storefront<S>, output: Option<PathBuf>) -> io::Result<ExitCode> {
    let json = match shop.export() {
        Ok(json) => json,
        Err(err) => return report("export failed", &err),
    };
    match output {
        Some(path) => {
            fs::write(&path, json)?;
            writeln!(
                io::stdout().lock(),
                "Exported to {}",
                path.display().bold()
            )?;
        }
        None => writeln!(io::stdout().lock(), "{json}")?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `import` subcommand.
fn cmd_import<S: Storage>(shop: &mut Storefront<S>, file: &Path) -> io::Result<ExitCode> {
    let json = fs::read_to_string(file)?;
    match shop.import(&json) {
        Ok(summary) => {
            let mut out = io::stdout().lock();
            for (label, count) in [
                ("products", summary.products),
                ("orders", summary.orders),
                ("users", summary.users),
            ] {
                match count {
                    Some(count) => writeln!(out, "  {label:<9} {count} imported")?,
                    None => writeln!(out, "  {label:<9} {}", "unchanged".dimmed())?,
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("import failed", &err),
    }
}

/// Prints the active notice, if any.
fn print_notice<S: Storage>(shop: &Storefront<S>) -> io::Result<()> {
    if let Some(notice) = shop.notice() {
        writeln!(io::stdout().lock(), "{} {}", "\u{2022}".cyan(), notice.message)?;
    }
    Ok(())
}

/// Formats a whole-unit amount with the store currency prefix.
fn format_money(amount: u64) -> String {
    format!("KES {amount}")
}

/// Prints the catalog in a table.
fn print_products_table(products: &[Product]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if products.is_empty() {
        writeln!(out, "{}", "No products yet.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Item").fg(Color::Cyan),
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Price").fg(Color::Cyan),
        Cell::new("Stock").fg(Color::Cyan),
    ]);

    for product in products {
        let label = match (&product.emoji, &product.brand) {
            (Some(emoji), Some(brand)) => format!("{emoji} {} ({brand})", product.name),
            (Some(emoji), None) => format!("{emoji} {}", product.name),
            (None, Some(brand)) => format!("{} ({brand})", product.name),
            (None, None) => product.name.clone(),
        };
        _ = table.add_row(vec![
            Cell::new(product.id),
            Cell::new(label),
            Cell::new(&product.category),
            Cell::new(format_money(product.price)),
            Cell::new(product.stock),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Catalog".green().bold(),
        format_args!("({})", products.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the cart with subtotal, delivery fee and total.
fn print_cart(cart: &Cart, delivery_fee: u64) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if cart.is_empty() {
        writeln!(out, "{}", "Your cart is empty.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Item").fg(Color::Cyan),
        Cell::new("Qty").fg(Color::Cyan),
        Cell::new("Price").fg(Color::Cyan),
        Cell::new("Line total").fg(Color::Cyan),
    ]);
    for line in cart.lines() {
        _ = table.add_row(vec![
            Cell::new(&line.product.name),
            Cell::new(line.quantity),
            Cell::new(format_money(line.product.price)),
            Cell::new(format_money(line.line_total())),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Cart".green().bold(),
        format_args!("({} items)", cart.item_count()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    writeln!(out, "  Subtotal  {}", format_money(cart.subtotal()))?;
    writeln!(out, "  Delivery  {}", format_money(delivery_fee))?;
    writeln!(
        out,
        "  {}     {}",
        "Total".bold(),
        format_money(cart.total(delivery_fee)).bold()
    )?;
    Ok(())
}

/// Prints orders in a table.
fn print_orders_table(orders: &[&Order]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if orders.is_empty() {
        writeln!(out, "{}", "No orders yet.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Order").fg(Color::Cyan),
        Cell::new("Placed").fg(Color::Cyan),
        Cell::new("Customer").fg(Color::Cyan),
        Cell::new("Items").fg(Color::Cyan),
        Cell::new("Total").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Deliver to").fg(Color::Cyan),
    ]);

    for order in orders {
        let status_color = match order.status {
            OrderStatus::Pending => Color::Yellow,
            OrderStatus::Dispatched => Color::Blue,
            OrderStatus::Delivered => Color::Green,
        };
        let delivery = &order.delivery;
        _ = table.add_row(vec![
            Cell::new(order.id),
            Cell::new(order.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&order.owner),
            Cell::new(order.item_count()),
            Cell::new(format_money(order.total)),
            Cell::new(order.status).fg(status_color),
            Cell::new(format!(
                "{}, {} ({}, {} door {})",
                delivery.recipient_name,
                delivery.phone,
                delivery.location,
                delivery.building,
                delivery.door
            )),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Orders".green().bold(),
        format_args!("({})", orders.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // If stderr itself failed there is nothing left to report to.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}
